//! Error types for session management

use docflow_domain::SessionId;
use thiserror::Error;

/// Errors that can occur in the session store and event bus
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session id is unknown, or was already swept
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
