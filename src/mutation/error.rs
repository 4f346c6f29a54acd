//! Error types for optimistic mutations.

use std::error::Error;
use std::fmt;

use super::MutationKind;
use crate::entity::PayloadError;
use crate::error::StoreError;
use crate::remote::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The remote call failed and the store was restored to its snapshot.
    RolledBack {
        kind: MutationKind,
        /// Display form of the target id.
        id: String,
        /// User-facing message: the server's, or "Failed to <kind> <name>".
        message: String,
        cause: RemoteError,
    },
    /// The payload could not be applied. Nothing was written to the store.
    InvalidPayload {
        kind: MutationKind,
        source: PayloadError,
    },
    /// Every provisional id the id type can express is already in the
    /// store. Nothing was written.
    ProvisionalIdsExhausted { name: &'static str },
    /// The store itself failed.
    Store(StoreError),
}

impl MutationError {
    pub fn kind(&self) -> Option<MutationKind> {
        match self {
            MutationError::RolledBack { kind, .. } | MutationError::InvalidPayload { kind, .. } => {
                Some(*kind)
            }
            MutationError::ProvisionalIdsExhausted { .. } => Some(MutationKind::Create),
            MutationError::Store(_) => None,
        }
    }

    /// The human-readable message to show for this failure.
    pub fn message(&self) -> String {
        match self {
            MutationError::RolledBack { message, .. } => message.clone(),
            MutationError::InvalidPayload { source, .. } => source.to_string(),
            MutationError::ProvisionalIdsExhausted { name } => {
                format!("No provisional {} id available", name)
            }
            MutationError::Store(e) => e.to_string(),
        }
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, MutationError::RolledBack { .. })
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::RolledBack { message, cause, .. } => {
                write!(f, "{} ({})", message, cause)
            }
            MutationError::InvalidPayload { kind, source } => {
                write!(f, "invalid {} payload: {}", kind, source)
            }
            MutationError::ProvisionalIdsExhausted { name } => {
                write!(f, "provisional {} ids exhausted", name)
            }
            MutationError::Store(e) => write!(f, "store error: {}", e),
        }
    }
}

impl Error for MutationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MutationError::RolledBack { cause, .. } => Some(cause),
            MutationError::InvalidPayload { source, .. } => Some(source),
            MutationError::ProvisionalIdsExhausted { .. } => None,
            MutationError::Store(e) => Some(e),
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        MutationError::Store(err)
    }
}
