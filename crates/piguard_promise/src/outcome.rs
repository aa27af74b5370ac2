//! The success-or-failure value stored by a resolved promise.

use crate::error::{BoxError, Error};

/// Result of a resolved [`Promise`](crate::Promise).
///
/// An `Outcome` is only produced by resolution and never changes afterwards.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The computation produced a value.
    Success(T),
    /// The computation failed.
    Failure(Error),
}

impl<T> Outcome<T> {
    /// Transforms the success payload, passing a failure through unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Transforms the success payload with a fallible function.
    ///
    /// An `Err` returned by `f` becomes a [`ErrorKind::Transform`](crate::ErrorKind::Transform)
    /// failure.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Outcome<U>
    where
        E: Into<BoxError>,
    {
        match self {
            Outcome::Success(value) => match f(value) {
                Ok(mapped) => Outcome::Success(mapped),
                Err(error) => Outcome::Failure(Error::transform(error)),
            },
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Chains another outcome-producing step onto a success.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns `true` for [`Outcome::Failure`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Returns the success value, if any.
    #[must_use]
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Borrows the outcome as a `Result`.
    pub fn as_result(&self) -> Result<&T, &Error> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }

    /// Converts the outcome into a `Result`, the value-or-error accessor.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<BoxError>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(Error::rejected(error)),
        }
    }
}
