//! Error types for coordination operations

use crate::tool::Tool;
use thiserror::Error;

/// Result type for calls into the external store/proxy/config clients
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure reported by an external client
///
/// The message is the backend's raw error text. It is surfaced to the
/// presentation layer verbatim, so nothing here rewraps or translates it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClientError {
    /// Raw error text from the backend
    pub message: String,
}

impl ClientError {
    /// Create a client error from the backend's raw message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Waiting for a tool's operation lock exceeded the configured deadline
///
/// Only produced when the coordinator is built with a lock timeout; the
/// default configuration waits indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("等待 {tool} 当前操作完成超时")]
pub struct LockTimeout {
    /// Tool whose lock could not be acquired in time
    pub tool: Tool,
}
