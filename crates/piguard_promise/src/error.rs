//! Error types carried by failed promises.

use core::error::Error as StdError;
use core::fmt;
use std::sync::Arc;

/// Boxed error accepted wherever a caller fails a promise.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Discriminates how a promise came to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The start routine (or an asynchronous step) reported a failure.
    Rejected,
    /// A fallible transform returned an error while processing a success value.
    Transform,
    /// Every resolver was dropped before the promise was resolved.
    Abandoned,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Rejected => write!(f, "rejected"),
            ErrorKind::Transform => write!(f, "transform failed"),
            ErrorKind::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// The failure stored by a promise.
///
/// Cloning is a reference count bump, so the same failure can be handed to
/// every continuation of a chain. A failure propagated from a parent promise
/// is the parent's value, unchanged.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct Error {
    kind: ErrorKind,
    source: Arc<dyn StdError + Send + Sync + 'static>,
}

/// Marker source for [`ErrorKind::Abandoned`].
#[derive(Debug, thiserror::Error)]
#[error("promise dropped every resolver without resolving")]
struct Abandoned;

impl Error {
    /// Creates an error of the given kind wrapping `source`.
    ///
    /// If `source` already is an [`Error`], it is returned as-is and `kind`
    /// is ignored.
    #[must_use]
    pub fn new(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        match source.into().downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => Self {
                kind,
                source: Arc::from(other),
            },
        }
    }

    /// Creates a [`ErrorKind::Rejected`] error.
    #[must_use]
    pub fn rejected(source: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Rejected, source)
    }

    /// Creates a [`ErrorKind::Transform`] error.
    #[must_use]
    pub fn transform(source: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Transform, source)
    }

    pub(crate) fn abandoned() -> Self {
        Self::new(ErrorKind::Abandoned, Abandoned)
    }

    /// Returns the kind of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the wrapped source error if it is of type `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}
