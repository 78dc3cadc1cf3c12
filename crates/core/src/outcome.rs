//! Two-outcome value carrier with single consumption
//!
//! [`Outcome`] holds a success payload, a failure payload, or nothing at all
//! once the payload has been taken. Reading a payload moves it out, so a
//! second read never observes the same value again.
//!
//! ```
//! use strata_core::Outcome;
//!
//! let mut outcome: Outcome<u32, &str> = Outcome::success(7);
//! assert_eq!(outcome.take_failure(), None);
//! assert_eq!(outcome.take_success(), Some(7));
//! assert_eq!(outcome.take_success(), None);
//! assert!(outcome.is_consumed());
//! ```

use core::fmt;
use core::mem;

use crate::error::ConsumedOutcome;

/// Tagged outcome holder
///
/// Constructed once from a success or a failure value and consumed at most
/// once along one branch. Moving an `Outcome` transfers the discriminant and
/// the payload; it never duplicates them.
#[must_use = "an outcome carries a payload that should be consumed"]
#[derive(PartialEq, Eq, Hash)]
pub enum Outcome<S, F> {
    /// Success payload
    Success(S),
    /// Failure payload
    Failure(F),
    /// The payload has been moved out
    Consumed,
}

impl<S, F> Outcome<S, F> {
    /// Creates a carrier holding a success payload
    #[inline]
    pub const fn success(value: S) -> Self {
        Self::Success(value)
    }

    /// Creates a carrier holding a failure payload
    #[inline]
    pub const fn failure(value: F) -> Self {
        Self::Failure(value)
    }

    /// Returns true while a success payload is held
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true while a failure payload is held
    #[inline]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns true once the payload has been taken
    #[inline]
    pub const fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed)
    }

    /// Moves the success payload out
    ///
    /// Leaves the carrier consumed on success. A carrier holding a failure is
    /// left untouched and `None` is returned.
    pub fn take_success(&mut self) -> Option<S> {
        if !self.is_success() {
            return None;
        }
        match mem::replace(self, Self::Consumed) {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Moves the failure payload out
    ///
    /// Mirror of [`take_success`](Self::take_success).
    pub fn take_failure(&mut self) -> Option<F> {
        if !self.is_failure() {
            return None;
        }
        match mem::replace(self, Self::Consumed) {
            Self::Failure(value) => Some(value),
            _ => None,
        }
    }

    /// Takes whichever payload is present
    ///
    /// Exactly one branch of the returned `Result` is populated. Returns
    /// `None` for a consumed carrier.
    pub fn take(&mut self) -> Option<Result<S, F>> {
        mem::replace(self, Self::Consumed).into_result()
    }

    /// Converts the carrier into a `Result`, or `None` if already consumed
    pub fn into_result(self) -> Option<Result<S, F>> {
        match self {
            Self::Success(value) => Some(Ok(value)),
            Self::Failure(value) => Some(Err(value)),
            Self::Consumed => None,
        }
    }

    /// Borrows the payload without consuming it
    pub const fn as_ref(&self) -> Outcome<&S, &F> {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(value) => Outcome::Failure(value),
            Self::Consumed => Outcome::Consumed,
        }
    }

    /// Maps the success payload, leaving failures untouched
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Outcome<T, F> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(value) => Outcome::Failure(value),
            Self::Consumed => Outcome::Consumed,
        }
    }

    /// Maps the failure payload, leaving successes untouched
    pub fn map_failure<G>(self, f: impl FnOnce(F) -> G) -> Outcome<S, G> {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(value) => Outcome::Failure(f(value)),
            Self::Consumed => Outcome::Consumed,
        }
    }
}

impl<S, F> From<Result<S, F>> for Outcome<S, F> {
    fn from(result: Result<S, F>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(value) => Self::Failure(value),
        }
    }
}

impl<S, F> TryFrom<Outcome<S, F>> for Result<S, F> {
    type Error = ConsumedOutcome;

    fn try_from(outcome: Outcome<S, F>) -> Result<Result<S, F>, ConsumedOutcome> {
        outcome.into_result().ok_or(ConsumedOutcome)
    }
}

impl<S: fmt::Debug, F: fmt::Debug> fmt::Debug for Outcome<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Self::Failure(value) => f.debug_tuple("Failure").field(value).finish(),
            Self::Consumed => f.write_str("Consumed"),
        }
    }
}

// A payload moves with its carrier and is never duplicated
static_assertions::assert_not_impl_any!(Outcome<String, String>: Clone);
static_assertions::assert_impl_all!(Outcome<String, String>: Send, Sync);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn success_is_taken_exactly_once() {
        let mut outcome: Outcome<String, u8> = Outcome::success("block".to_string());

        assert_eq!(outcome.take_success().as_deref(), Some("block"));
        assert_eq!(outcome.take_success(), None);
        assert!(outcome.is_consumed());
    }

    #[test]
    fn failure_is_not_visible_as_success() {
        let mut outcome: Outcome<u32, &str> = Outcome::failure("zero size");

        assert_eq!(outcome.take_success(), None);
        assert!(outcome.is_failure(), "failed success query must not consume");
        assert_eq!(outcome.take_failure(), Some("zero size"));
        assert_eq!(outcome.take_failure(), None);
    }

    #[test]
    fn take_populates_one_branch() {
        let mut ok: Outcome<u32, &str> = Outcome::success(1);
        let mut err: Outcome<u32, &str> = Outcome::failure("bad");

        assert_eq!(ok.take(), Some(Ok(1)));
        assert_eq!(err.take(), Some(Err("bad")));
        assert_eq!(ok.take(), None);
        assert_eq!(err.take(), None);
    }

    #[test]
    fn moved_outcome_keeps_its_payload() {
        let outcome: Outcome<Vec<u8>, ()> = Outcome::success(vec![1, 2, 3]);
        let mut moved = outcome;
        assert_eq!(moved.take_success(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn result_conversions() {
        let outcome = Outcome::from(Ok::<u8, &str>(4));
        assert_eq!(<Result<u8, &str>>::try_from(outcome), Ok(Ok(4)));

        let mut consumed = Outcome::from(Err::<u8, &str>("x"));
        let _ = consumed.take();
        assert_eq!(<Result<u8, &str>>::try_from(consumed), Err(ConsumedOutcome));
    }

    #[test]
    fn map_preserves_branch() {
        let doubled = Outcome::<u32, ()>::success(21).map(|v| v * 2);
        assert_eq!(doubled, Outcome::Success(42));

        let renamed = Outcome::<(), u8>::failure(3).map_failure(|code| format!("E{code}"));
        assert_eq!(renamed, Outcome::Failure("E3".to_string()));
        assert!(Outcome::<(), u8>::Consumed.map(|()| 1).is_consumed());
    }
}
