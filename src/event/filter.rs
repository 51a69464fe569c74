//! Wait filters: which pending call events a wait operation accepts.
//!
//! A [`CallFilter`] is a closed composition over {any watched call, one mock,
//! one method, one method with argument predicates}, optionally restricted to
//! one originating launch. Matching is a pure predicate over a call event, so
//! it is testable independently of scheduling.

use std::fmt;
use std::rc::Rc;

use crate::engine::{LaunchHandle, LaunchId};
use crate::event::call::CallEvent;
use crate::event::Args;
use crate::matcher::Matcher;
use crate::mock::{MockId, MockPort};

/// A predicate over a captured argument list, with a description for
/// diagnostics.
#[derive(Clone)]
pub struct ArgPredicate {
    description: String,
    test: Rc<dyn Fn(&Args) -> bool>,
}

impl ArgPredicate {
    /// Build a predicate applying `matcher` to the `index`-th argument.
    ///
    /// A call whose `index`-th argument is missing or has a different type
    /// does not match.
    pub fn arg<T, M>(index: usize, matcher: M) -> Self
    where
        T: std::any::Any,
        M: Matcher<T> + 'static,
    {
        Self {
            description: format!("arg[{index}] {}", matcher.describe()),
            test: Rc::new(move |args: &Args| {
                args.get_ref::<T>(index).is_some_and(|v| matcher.matches(v))
            }),
        }
    }

    /// Build a free-form predicate over the whole argument list.
    pub fn matching<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Args) -> bool + 'static,
    {
        Self {
            description: description.into(),
            test: Rc::new(test),
        }
    }

    pub(crate) fn eval(&self, args: &Args) -> bool {
        (self.test)(args)
    }

    pub(crate) fn describe(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ArgPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Filter describing which call events a wait operation accepts.
///
/// The default filter accepts any watched call from any launch.
///
/// # Example
///
/// ```rust,ignore
/// use mock_rendezvous::event::CallFilter;
/// use mock_rendezvous::matcher::eq;
///
/// let filter = CallFilter::on(&port).method("GoTo").where_arg(0, eq(-1));
/// let call = fx.wait_for_call(filter)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallFilter {
    mock: Option<(MockId, String)>,
    method: Option<&'static str>,
    predicates: Vec<ArgPredicate>,
    from: Option<LaunchId>,
}

impl CallFilter {
    /// Accept any watched call.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept only calls on the given mock.
    #[must_use]
    pub fn on(mock: &MockPort) -> Self {
        Self {
            mock: Some((mock.id(), mock.name().to_string())),
            ..Self::default()
        }
    }

    /// Narrow to one method name.
    #[must_use]
    pub fn method(mut self, name: &'static str) -> Self {
        self.method = Some(name);
        self
    }

    /// Narrow with a matcher applied to the `index`-th argument.
    #[must_use]
    pub fn where_arg<T, M>(mut self, index: usize, matcher: M) -> Self
    where
        T: std::any::Any,
        M: Matcher<T> + 'static,
    {
        self.predicates.push(ArgPredicate::arg(index, matcher));
        self
    }

    /// Narrow with a free-form predicate over the whole argument list.
    #[must_use]
    pub fn matching<F>(mut self, description: &str, test: F) -> Self
    where
        F: Fn(&Args) -> bool + 'static,
    {
        self.predicates.push(ArgPredicate::matching(description, test));
        self
    }

    /// Restrict to events originating from one launch.
    #[must_use]
    pub fn from_launch<T>(mut self, launch: &LaunchHandle<T>) -> Self {
        self.from = Some(launch.id());
        self
    }

    pub(crate) fn matches(&self, event: &CallEvent) -> bool {
        if let Some((mock, _)) = &self.mock {
            if event.mock != *mock {
                return false;
            }
        }
        if let Some(method) = self.method {
            if event.method != method {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.launch != from {
                return false;
            }
        }
        self.predicates.iter().all(|p| p.eval(&event.args))
    }

    pub(crate) fn describe(&self) -> String {
        let mut out = match (&self.mock, self.method) {
            (None, None) => "any watched call".to_string(),
            (None, Some(method)) => format!("call to {method}"),
            (Some((_, name)), None) => format!("any call on {name}"),
            (Some((_, name)), Some(method)) => format!("call {name}.{method}"),
        };
        for p in &self.predicates {
            out.push_str(" where ");
            out.push_str(p.describe());
        }
        if let Some(from) = self.from {
            out.push_str(&format!(" from {from}"));
        }
        out
    }
}
