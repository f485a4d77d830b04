//! Error types for the ShadowPad client.

use shadowpad_shared::cipher::CipherError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The server refused the WebSocket upgrade with an HTTP status.
    #[error("Server refused the WebSocket connection with HTTP {0}")]
    HandshakeRejected(u16),

    /// The line typed could not be understood.
    #[error("{0}")]
    InvalidCommand(String),

    /// The command needs a room, but none has been joined.
    #[error("You are not in a room (use /create or /join)")]
    NotInRoom,

    /// The pad could not be decrypted with the password in use, so it must
    /// not be overwritten from this session.
    #[error("The pad is unreadable with this password; refusing to overwrite it")]
    UnreadablePad,

    #[error("Encryption error: {0}")]
    Cipher(#[from] CipherError),

    /// The pad API answered with an error status.
    #[error("Server rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
