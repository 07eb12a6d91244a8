//! Error types for the comanda-link client.

use thiserror::Error;

/// Errors produced by the order feed client.
#[derive(Error, Debug)]
pub enum ComandaLinkError {
    /// Invalid client configuration (endpoint, options).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// WebSocket transport failure (connect, send, close).
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Authentication problem (missing or rejected token).
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Failed to serialize an outbound frame.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for order feed operations.
pub type Result<T> = std::result::Result<T, ComandaLinkError>;
