//! Error types for the A/V processor control client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AvpError>;

/// A/V processor client error types.
#[derive(Debug, Error)]
pub enum AvpError {
    /// Connection timeout
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// Bad host or port; not retried until reconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter passed to a command intent
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Client has been disposed; no further operations are possible
    #[error("Client disposed")]
    Disposed,
}

impl AvpError {
    /// Create a configuration error with a message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid-parameter error with a message.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Check if the client should schedule an automatic reconnect for this
    /// error. Configuration errors require reconfiguration instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionTimeout | Self::Io(_))
    }
}
