use std::fmt;
use thiserror::Error;

/// Number of arguments a list method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => (min..=max).contains(&count),
        }
    }

    /// Fails with `InvalidArgumentCount` when `count` is outside this arity.
    pub fn check(&self, method: &str, count: usize) -> Result<()> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(ListError::InvalidArgumentCount {
                method: method.to_string(),
                expected: *self,
                actual: count,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
            Self::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListError {
    #[error("Requested index {index} is out of range for list of length {size}")]
    OutOfRange { index: usize, size: usize },

    #[error("The '{0}' property is readonly")]
    ReadOnlyProperty(String),

    #[error("Invalid arguments for '{method}': expected {expected} argument(s), got {actual}")]
    InvalidArgumentCount {
        method: String,
        expected: Arity,
        actual: usize,
    },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Cannot modify managed objects outside of a write transaction")]
    WriteOutsideTransaction,

    #[error("Access to invalidated list: the owning store session is closed")]
    Invalidated,

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),
}

pub type Result<T> = std::result::Result<T, ListError>;

/// Host-visible classification of a failure.
///
/// `OutOfRangeRead` and `NotAnIndexKey` never reach the caller as errors:
/// the property protocol absorbs them into `Undefined` and `NotHandled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfRangeRead,
    OutOfRangeWrite,
    NotAnIndexKey,
    ReadOnlyProperty,
    InvalidArgumentCount,
    TypeMismatch,
    WriteOutsideTransaction,
    Invalidated,
    InvalidQuery,
    StoreFailure,
}

impl ListError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. } => ErrorKind::OutOfRangeWrite,
            Self::ReadOnlyProperty(_) => ErrorKind::ReadOnlyProperty,
            Self::InvalidArgumentCount { .. } => ErrorKind::InvalidArgumentCount,
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::WriteOutsideTransaction => ErrorKind::WriteOutsideTransaction,
            Self::Invalidated => ErrorKind::Invalidated,
            Self::Query(_) => ErrorKind::InvalidQuery,
            Self::StoreFailure(_) => ErrorKind::StoreFailure,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ListError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::StoreFailure(format!("store lock poisoned: {}", err))
    }
}
