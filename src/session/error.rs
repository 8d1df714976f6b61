//! Session error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation needed the agent before `connect()` succeeded
    #[error("Agent not connected. Please call connect() first.")]
    NotConnected,

    /// Configuration, spawn, handshake or tool discovery failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The agent invocation itself failed
    #[error("{0}")]
    Invocation(String),

    /// A report handle could not be turned into content
    #[error("Could not resolve report '{handle}': {reason}")]
    Resolution { handle: String, reason: String },
}

impl SessionError {
    pub fn is_connection(&self) -> bool {
        matches!(self, SessionError::Connection(_) | SessionError::NotConnected)
    }
}
