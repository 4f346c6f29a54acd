use std::fmt;

/// Error type for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The call could not complete (connection failure, timeout).
    Transport(String),
    /// The call completed with a non-success status.
    Rejected {
        status: u16,
        /// Message supplied by the server, when it sent one.
        message: Option<String>,
    },
    /// The response body could not be decoded.
    Decode(String),
}

impl RemoteError {
    pub fn rejected(status: u16) -> Self {
        RemoteError::Rejected {
            status,
            message: None,
        }
    }

    pub fn rejected_with(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            status,
            message: Some(message.into()),
        }
    }

    /// HTTP-style status code, when the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message supplied by the server.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RemoteError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transport(msg) => write!(f, "transport error: {}", msg),
            RemoteError::Rejected {
                status,
                message: Some(message),
            } => write!(f, "rejected with status {}: {}", status, message),
            RemoteError::Rejected {
                status,
                message: None,
            } => write!(f, "rejected with status {}", status),
            RemoteError::Decode(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}
