//! Argument capture for intercepted calls.
//!
//! Arguments are snapshotted by value at the call site, together with their
//! `Debug` rendering so diagnostics can name a call as
//! `turtle.GoTo(-1, 1)` without knowing the argument types.

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Build an [`Args`] snapshot from a list of expressions.
///
/// Each argument is captured by value and must be `Debug + 'static`.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::args;
///
/// let a = args![24, "label"];
/// assert_eq!(a.len(), 2);
/// assert_eq!(a.get::<i32>(0).unwrap(), 24);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::event::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {{
        let mut captured = $crate::event::Args::new();
        $( captured.push($arg); )+
        captured
    }};
}

/// One captured argument: its value and its `Debug` rendering.
#[derive(Clone)]
struct ArgValue {
    rendered: String,
    type_name: &'static str,
    value: Rc<dyn Any>,
}

/// An ordered, immutable snapshot of the arguments of one intercepted call.
///
/// Cloning is cheap; captured values are shared.
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Create an empty argument snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture one argument by value.
    pub fn push<T: Any + fmt::Debug>(&mut self, value: T) {
        self.values.push(ArgValue {
            rendered: format!("{value:?}"),
            type_name: type_name::<T>(),
            value: Rc::new(value),
        });
    }

    /// Number of captured arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no arguments were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a clone of the n-th captured argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the stored argument has a different
    /// type, or [`Error::StaleHandle`] if the index is out of range.
    pub fn get<T: Any + Clone>(&self, index: usize) -> Result<T> {
        let slot = self.values.get(index).ok_or_else(|| {
            Error::stale(format!(
                "argument index {index} out of range ({} captured)",
                self.values.len()
            ))
        })?;
        slot.value.downcast_ref::<T>().cloned().ok_or_else(|| {
            Error::type_mismatch(format!("argument {index}"), slot.type_name, type_name::<T>())
        })
    }

    /// Borrow the n-th captured argument, if it has the requested type.
    #[must_use]
    pub fn get_ref<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.value.downcast_ref::<T>()
    }

    /// The `Debug` rendering of the n-th argument.
    #[must_use]
    pub fn rendered(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|v| v.rendered.as_str())
    }

    /// Render the whole argument list, comma separated.
    #[must_use]
    pub fn render_all(&self) -> String {
        let parts: Vec<_> = self.values.iter().map(|v| v.rendered.as_str()).collect();
        parts.join(", ")
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.render_all())
    }
}
