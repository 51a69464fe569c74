//! Watch registrations: which calls take the rendezvous path.
//!
//! Calls covered by a watch suspend and surface as call events; calls covered
//! by no watch fall back to standing expectations. Watches are additive and
//! fixture-scoped, so nothing outlives the test case.

use crate::event::{ArgPredicate, Args};
use crate::mock::MockId;

/// The scope of one watch registration.
pub(crate) enum WatchScope {
    /// Every call on every mock of the fixture.
    AnyMock,
    /// Every call on one mock.
    Mock(MockId),
    /// One method on one mock.
    Method(MockId, &'static str),
    /// One method on one mock, only when the arguments satisfy the predicate.
    MethodMatching(MockId, &'static str, ArgPredicate),
}

/// A standing registration routing matching calls through the rendezvous
/// engine.
pub(crate) struct WatchSpec {
    pub scope: WatchScope,
}

impl WatchSpec {
    pub(crate) fn covers(&self, mock: MockId, method: &str, args: &Args) -> bool {
        match &self.scope {
            WatchScope::AnyMock => true,
            WatchScope::Mock(id) => *id == mock,
            WatchScope::Method(id, name) => *id == mock && *name == method,
            WatchScope::MethodMatching(id, name, predicate) => {
                *id == mock && *name == method && predicate.eval(args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::lt;

    #[test]
    fn test_any_mock_covers_everything() {
        let spec = WatchSpec {
            scope: WatchScope::AnyMock,
        };
        assert!(spec.covers(MockId::new(), "GoTo", &crate::args![]));
    }

    #[test]
    fn test_mock_scope() {
        let mock = MockId::new();
        let spec = WatchSpec {
            scope: WatchScope::Mock(mock),
        };
        assert!(spec.covers(mock, "GoTo", &crate::args![]));
        assert!(!spec.covers(MockId::new(), "GoTo", &crate::args![]));
    }

    #[test]
    fn test_method_scope() {
        let mock = MockId::new();
        let spec = WatchSpec {
            scope: WatchScope::Method(mock, "GoTo"),
        };
        assert!(spec.covers(mock, "GoTo", &crate::args![]));
        assert!(!spec.covers(mock, "PenUp", &crate::args![]));
        assert!(!spec.covers(MockId::new(), "GoTo", &crate::args![]));
    }

    #[test]
    fn test_method_matching_scope() {
        let mock = MockId::new();
        let spec = WatchSpec {
            scope: WatchScope::MethodMatching(mock, "GoTo", ArgPredicate::arg(0, lt(0))),
        };
        assert!(spec.covers(mock, "GoTo", &crate::args![-1, 1]));
        assert!(!spec.covers(mock, "GoTo", &crate::args![1, 1]));
    }
}
