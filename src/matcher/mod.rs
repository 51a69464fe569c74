// Allow must_use_candidate for matcher factory functions since returning the matcher
// without using it is the common pattern for test setup
#![allow(clippy::must_use_candidate)]

//! Value matchers for argument filtering and assertions.
//!
//! Matchers describe what an intercepted argument should look like without
//! naming an exact value. They plug into [`CallFilter::where_arg`] and into
//! [`assert_that!`] for direct assertions.
//!
//! [`CallFilter::where_arg`]: crate::event::CallFilter::where_arg
//!
//! # Example
//!
//! ```rust
//! use mock_rendezvous::matcher::{eq, lt, not, Matcher};
//!
//! let m = eq(42);
//! assert!(m.matches(&42));
//!
//! let m = lt(10);
//! assert!(m.matches(&5));
//!
//! let m = not(eq(0));
//! assert!(m.matches(&1));
//! ```

use std::fmt::Debug;

/// A matcher for testing values.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use mock_rendezvous::matcher::Matcher;
///
/// struct IsEven;
///
/// impl Matcher<i32> for IsEven {
///     fn matches(&self, value: &i32) -> bool {
///         value % 2 == 0
///     }
///
///     fn describe(&self) -> String {
///         "is even".to_string()
///     }
/// }
///
/// let m = IsEven;
/// assert!(m.matches(&4));
/// assert!(!m.matches(&3));
/// ```
pub trait Matcher<T: ?Sized> {
    /// Check if the value matches.
    fn matches(&self, value: &T) -> bool;

    /// Describe what this matcher expects.
    fn describe(&self) -> String;

    /// Describe why a value didn't match.
    fn describe_mismatch(&self, value: &T) -> String
    where
        T: Debug,
    {
        format!("{:?} does not match: {}", value, self.describe())
    }
}

/// Assert that a value matches a matcher.
///
/// # Panics
///
/// Panics with a descriptive message if the value doesn't match.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::{assert_that, matcher::eq};
///
/// assert_that!(42, eq(42));
/// ```
#[macro_export]
macro_rules! assert_that {
    ($value:expr, $matcher:expr) => {{
        let value = &$value;
        let matcher = &$matcher;
        if !$crate::matcher::Matcher::matches(matcher, value) {
            panic!(
                "assertion failed: {}\n  expected: {}\n  got: {:?}",
                $crate::matcher::Matcher::describe_mismatch(matcher, value),
                $crate::matcher::Matcher::describe(matcher),
                value
            );
        }
    }};
    ($value:expr, $matcher:expr, $($arg:tt)+) => {{
        let value = &$value;
        let matcher = &$matcher;
        if !$crate::matcher::Matcher::matches(matcher, value) {
            panic!(
                "assertion failed: {}\n  expected: {}\n  got: {:?}\n  message: {}",
                $crate::matcher::Matcher::describe_mismatch(matcher, value),
                $crate::matcher::Matcher::describe(matcher),
                value,
                format_args!($($arg)+)
            );
        }
    }};
}

// =============================================================================
// Built-in Matchers
// =============================================================================

/// Create an equality matcher.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, eq};
///
/// let m = eq(42);
/// assert!(m.matches(&42));
/// assert!(!m.matches(&0));
/// ```
pub fn eq<T: PartialEq + Debug>(expected: T) -> EqMatcher<T> {
    EqMatcher { expected }
}

/// Matcher for equality.
pub struct EqMatcher<T> {
    expected: T,
}

impl<T: PartialEq + Debug> Matcher<T> for EqMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value == &self.expected
    }

    fn describe(&self) -> String {
        format!("equals {:?}", self.expected)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not equal {:?}", value, self.expected)
    }
}

/// Create a greater-than matcher.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, gt};
///
/// let m = gt(10);
/// assert!(m.matches(&20));
/// assert!(!m.matches(&5));
/// ```
pub fn gt<T: PartialOrd + Debug>(threshold: T) -> GtMatcher<T> {
    GtMatcher { threshold }
}

/// Matcher for greater-than comparison.
pub struct GtMatcher<T> {
    threshold: T,
}

impl<T: PartialOrd + Debug> Matcher<T> for GtMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value > &self.threshold
    }

    fn describe(&self) -> String {
        format!("is greater than {:?}", self.threshold)
    }
}

/// Create a greater-than-or-equal matcher.
pub fn gte<T: PartialOrd + Debug>(threshold: T) -> GteMatcher<T> {
    GteMatcher { threshold }
}

/// Matcher for greater-than-or-equal comparison.
pub struct GteMatcher<T> {
    threshold: T,
}

impl<T: PartialOrd + Debug> Matcher<T> for GteMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value >= &self.threshold
    }

    fn describe(&self) -> String {
        format!("is greater than or equal to {:?}", self.threshold)
    }
}

/// Create a less-than matcher.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, lt};
///
/// let m = lt(10);
/// assert!(m.matches(&5));
/// assert!(!m.matches(&20));
/// ```
pub fn lt<T: PartialOrd + Debug>(threshold: T) -> LtMatcher<T> {
    LtMatcher { threshold }
}

/// Matcher for less-than comparison.
pub struct LtMatcher<T> {
    threshold: T,
}

impl<T: PartialOrd + Debug> Matcher<T> for LtMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value < &self.threshold
    }

    fn describe(&self) -> String {
        format!("is less than {:?}", self.threshold)
    }
}

/// Create a less-than-or-equal matcher.
pub fn lte<T: PartialOrd + Debug>(threshold: T) -> LteMatcher<T> {
    LteMatcher { threshold }
}

/// Matcher for less-than-or-equal comparison.
pub struct LteMatcher<T> {
    threshold: T,
}

impl<T: PartialOrd + Debug> Matcher<T> for LteMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value <= &self.threshold
    }

    fn describe(&self) -> String {
        format!("is less than or equal to {:?}", self.threshold)
    }
}

/// Create a matcher that always matches.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, anything};
///
/// let m = anything::<i32>();
/// assert!(m.matches(&42));
/// assert!(m.matches(&0));
/// ```
pub fn anything<T>() -> AnythingMatcher<T> {
    AnythingMatcher {
        _phantom: std::marker::PhantomData,
    }
}

/// Matcher that matches anything.
pub struct AnythingMatcher<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Matcher<T> for AnythingMatcher<T> {
    fn matches(&self, _value: &T) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything".to_string()
    }
}

/// Create a predicate-based matcher.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, satisfies};
///
/// let m = satisfies(|x: &i32| *x % 2 == 0, "is even");
/// assert!(m.matches(&4));
/// assert!(!m.matches(&3));
/// ```
pub fn satisfies<T, F>(predicate: F, description: &str) -> PredicateMatcher<T, F>
where
    F: Fn(&T) -> bool,
{
    PredicateMatcher {
        predicate,
        description: description.to_string(),
        _phantom: std::marker::PhantomData,
    }
}

/// Matcher based on a predicate function.
pub struct PredicateMatcher<T, F> {
    predicate: F,
    description: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F: Fn(&T) -> bool> Matcher<T> for PredicateMatcher<T, F> {
    fn matches(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Create a negating matcher.
///
/// # Example
///
/// ```rust
/// use mock_rendezvous::matcher::{Matcher, not, eq};
///
/// let m = not(eq(0));
/// assert!(m.matches(&1));
/// assert!(!m.matches(&0));
/// ```
pub fn not<T, M: Matcher<T> + 'static>(matcher: M) -> NotMatcher<T> {
    NotMatcher {
        inner: Box::new(matcher),
    }
}

/// Matcher that negates another matcher.
pub struct NotMatcher<T: ?Sized> {
    inner: Box<dyn Matcher<T>>,
}

impl<T> Matcher<T> for NotMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        !self.inner.matches(value)
    }

    fn describe(&self) -> String {
        format!("not {}", self.inner.describe())
    }
}

// Implement Matcher for Box<dyn Matcher> to allow nesting
impl<T: ?Sized> Matcher<T> for Box<dyn Matcher<T>> {
    fn matches(&self, value: &T) -> bool {
        (**self).matches(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_matcher() {
        let m = eq(42);
        assert!(m.matches(&42));
        assert!(!m.matches(&0));
    }

    #[test]
    fn test_gt_matcher() {
        let m = gt(10);
        assert!(m.matches(&20));
        assert!(!m.matches(&10));
        assert!(!m.matches(&5));
    }

    #[test]
    fn test_gte_matcher() {
        let m = gte(10);
        assert!(m.matches(&20));
        assert!(m.matches(&10));
        assert!(!m.matches(&5));
    }

    #[test]
    fn test_lt_matcher() {
        let m = lt(10);
        assert!(m.matches(&5));
        assert!(!m.matches(&10));
        assert!(!m.matches(&20));
    }

    #[test]
    fn test_lte_matcher() {
        let m = lte(10);
        assert!(m.matches(&5));
        assert!(m.matches(&10));
        assert!(!m.matches(&20));
    }

    #[test]
    fn test_anything_matcher() {
        let m = anything::<i32>();
        assert!(m.matches(&42));
        assert!(m.matches(&0));
        assert!(m.matches(&-100));
    }

    #[test]
    fn test_satisfies_matcher() {
        let m = satisfies(|x: &i32| *x % 2 == 0, "is even");
        assert!(m.matches(&4));
        assert!(!m.matches(&3));
    }

    #[test]
    fn test_not_combinator() {
        let m = not(eq(0));
        assert!(m.matches(&1));
        assert!(!m.matches(&0));
    }

    #[test]
    fn test_assert_that_macro() {
        assert_that!(42, eq(42));
        assert_that!(5, lt(10));
        assert_that!(
            "hello",
            satisfies(|s: &&str| s.contains("ell"), "contains 'ell'")
        );
    }

    #[test]
    #[should_panic(expected = "does not equal")]
    fn test_assert_that_fails() {
        assert_that!(42, eq(0));
    }

    #[test]
    fn test_matcher_describe() {
        assert_eq!(eq(42).describe(), "equals 42");
        assert_eq!(gt(10).describe(), "is greater than 10");
        assert_eq!(lt(10).describe(), "is less than 10");
        assert_eq!(not(eq(0)).describe(), "not equals 0");
    }

    #[test]
    fn test_matcher_describe_mismatch() {
        assert!(eq(42).describe_mismatch(&0).contains("does not equal"));
        assert!(lt(10).describe_mismatch(&20).contains("is less than"));
    }
}
