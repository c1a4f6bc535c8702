//! Error types for EmberKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    /// Malformed wire data. The stream cannot be resynchronized.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Peer closed the stream at a request boundary
    #[error("Client disconnected")]
    Disconnect,

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    /// Well-formed request that names an invalid command.
    /// The message is sent to the client verbatim.
    #[error("{0}")]
    Command(String),

    /// Error reply received from the server (client side)
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Shorthand for building a command error
    pub fn command(message: impl Into<String>) -> Self {
        KvError::Command(message.into())
    }

    /// Shorthand for building a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        KvError::Protocol(message.into())
    }
}
