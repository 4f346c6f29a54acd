use std::error::Error;
use std::fmt;

use crate::error::StoreError;
use crate::remote::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefetchError {
    /// The list call failed. The store was not modified.
    Remote(RemoteError),
    Store(StoreError),
}

impl fmt::Display for RefetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefetchError::Remote(e) => write!(f, "refetch failed: {}", e),
            RefetchError::Store(e) => write!(f, "store error: {}", e),
        }
    }
}

impl Error for RefetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RefetchError::Remote(e) => Some(e),
            RefetchError::Store(e) => Some(e),
        }
    }
}

impl From<RemoteError> for RefetchError {
    fn from(err: RemoteError) -> Self {
        RefetchError::Remote(err)
    }
}

impl From<StoreError> for RefetchError {
    fn from(err: StoreError) -> Self {
        RefetchError::Store(err)
    }
}
