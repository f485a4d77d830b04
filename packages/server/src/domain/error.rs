//! ドメイン層のエラー型

use thiserror::Error;

/// Errors surfaced to the connection that issued a request.
///
/// `Display` output is user-facing: it becomes the `reason` of an
/// `error-msg` frame sent to the originating connection only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room already exists")]
    RoomExists,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Incorrect password")]
    IncorrectSecret,

    #[error("Room is full")]
    RoomFull,

    /// The requester lacks the host role or the capability involved.
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// A participant, file or membership referenced by the request is absent.
    #[error("{0} not found")]
    NotFound(String),

    #[error("File is too large ({size} bytes, limit is {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// A pad save that does not continue the stored chain (other salt, or a
    /// step not past the stored one).
    #[error("The pad was saved elsewhere (stored snapshot {stored_step}); save again to continue from it")]
    StaleSnapshot { stored_step: u64 },

    /// The pad store failed; details are logged, not sent to clients.
    #[error("Storage is unavailable, please try again")]
    Storage,
}

impl From<ValueObjectError> for RoomError {
    fn from(e: ValueObjectError) -> Self {
        RoomError::InvalidInput(e.to_string())
    }
}

/// 値オブジェクト生成時の検証エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("{0}")]
    InvalidRoomId(String),

    #[error("connection id is empty")]
    InvalidConnectionId,

    #[error("maxUsers must be between 2 and 60 (got {0})")]
    InvalidMaxUsers(usize),
}

/// Repository 操作のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Room '{0}' is already resident")]
    RoomAlreadyExists(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Pad ストア（永続化層）のエラー
#[derive(Debug, Error)]
pub enum PadStoreError {
    #[error("pad store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pad record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
