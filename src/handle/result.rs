//! Handles to observed launch completions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{Core, LaunchHandle, LaunchId, LaunchState};
use crate::error::{Error, Result};

/// Non-owning reference to one launch's completion.
///
/// Obtained from [`Fixture::wait_for_result`]. Applying the handle to the
/// [`LaunchHandle`] of the same launch yields the stored return value.
///
/// [`Fixture::wait_for_result`]: crate::Fixture::wait_for_result
#[derive(Clone)]
pub struct ResultHandle {
    launch: LaunchId,
    core: Rc<RefCell<Core>>,
}

impl ResultHandle {
    pub(crate) fn new(launch: LaunchId, core: Rc<RefCell<Core>>) -> Self {
        Self { launch, core }
    }

    /// The completed launch's identifier.
    #[must_use]
    pub fn launch_id(&self) -> LaunchId {
        self.launch
    }

    /// Whether the wait was satisfied by genuine completion.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.core.borrow().state_of(self.launch) == Some(LaunchState::Completed)
    }

    /// Whether this handle corresponds to `launch`.
    #[must_use]
    pub fn is_result_of<T>(&self, launch: &LaunchHandle<T>) -> bool {
        self.launch == launch.id()
    }

    /// Take the stored return value of `launch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongLaunch`] if this handle does not correspond to
    /// `launch`, and [`Error::StaleHandle`] if the launch was abandoned or
    /// the value was already taken.
    pub fn value<T: 'static>(&self, launch: &LaunchHandle<T>) -> Result<T> {
        if self.launch != launch.id() {
            return Err(Error::WrongLaunch {
                actual: self.launch.to_string(),
                requested: launch.id().to_string(),
            });
        }
        let mut core = self.core.borrow_mut();
        let Some(context) = core.context_mut(self.launch) else {
            return Err(Error::stale(format!("unknown launch {}", self.launch)));
        };
        match context.state {
            LaunchState::Completed => {}
            LaunchState::Abandoned => {
                return Err(Error::stale(format!("launch {} abandoned", self.launch)));
            }
            state => {
                return Err(Error::stale(format!(
                    "launch {} not completed (state {state})",
                    self.launch
                )));
            }
        }
        let stored_type = context.result_type;
        let Some(boxed) = context.result.take() else {
            return Err(Error::stale(format!(
                "result of {} already taken",
                self.launch
            )));
        };
        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            Error::type_mismatch(
                format!("result of {}", self.launch),
                stored_type,
                std::any::type_name::<T>(),
            )
        })
    }
}

impl fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("launch", &self.launch)
            .field("completed", &self.completed())
            .finish()
    }
}
