//! 値オブジェクト
//!
//! 生の文字列・数値をそのまま扱わず、生成時に検証・正規化した型を使います。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a room id, in characters.
pub const ROOM_ID_MAX_LEN: usize = 64;

/// Maximum length of a display name, in characters.
pub const DISPLAY_NAME_MAX_LEN: usize = 32;

/// Name shown for participants who did not give one.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Room identifier and join key.
///
/// Normalized by trimming surrounding whitespace and uppercasing, so
/// `"alpha"`, `" Alpha "` and `"ALPHA"` all name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn new(raw: &str) -> Result<Self, ValueObjectError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ValueObjectError::InvalidRoomId("room id is empty".to_string()));
        }
        if normalized.chars().count() > ROOM_ID_MAX_LEN {
            return Err(ValueObjectError::InvalidRoomId(format!(
                "room id is longer than {} characters",
                ROOM_ID_MAX_LEN
            )));
        }
        if normalized.chars().any(char::is_control) {
            return Err(ValueObjectError::InvalidRoomId(
                "room id contains control characters".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random id for a new connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an id received from a client (e.g. a promote/kick target).
    pub fn new(raw: impl Into<String>) -> Result<Self, ValueObjectError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValueObjectError::InvalidConnectionId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant display name.
///
/// Trimmed and capped at [`DISPLAY_NAME_MAX_LEN`] characters; blank names
/// become [`ANONYMOUS_NAME`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self(ANONYMOUS_NAME.to_string());
        }
        Self(trimmed.chars().take(DISPLAY_NAME_MAX_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxUsers(usize);

impl MaxUsers {
    pub const DEFAULT: usize = 20;
    pub const MIN: usize = 2;
    pub const MAX: usize = 60;

    /// Requested capacity, which must lie in `MIN..=MAX`; `None` means [`Self::DEFAULT`].
    pub fn new(requested: Option<usize>) -> Result<Self, ValueObjectError> {
        match requested {
            None => Ok(Self(Self::DEFAULT)),
            Some(n) if (Self::MIN..=Self::MAX).contains(&n) => Ok(Self(n)),
            Some(n) => Err(ValueObjectError::InvalidMaxUsers(n)),
        }
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl Default for MaxUsers {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// One of the three gated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Edit,
    Upload,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Edit, Capability::Upload, Capability::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Edit => "edit",
            Capability::Upload => "upload",
            Capability::Delete => "delete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment identifier, unique within its room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_is_normalized() {
        // テスト項目: RoomId は前後の空白を除去し大文字に正規化される
        // given (前提条件):
        let raw = "  alpha-Room ";

        // when (操作):
        let id = RoomId::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(id.as_str(), "ALPHA-ROOM");
        assert_eq!(id, RoomId::new("ALPHA-ROOM").unwrap());
    }

    #[test]
    fn test_room_id_rejects_blank_and_oversized() {
        // テスト項目: 空文字列・長すぎる RoomId・制御文字はエラーになる
        // given (前提条件):
        let too_long = "x".repeat(ROOM_ID_MAX_LEN + 1);

        // when (操作):
        let blank = RoomId::new("   ");
        let long = RoomId::new(&too_long);
        let control = RoomId::new("room\u{0007}");

        // then (期待する結果):
        assert!(matches!(blank, Err(ValueObjectError::InvalidRoomId(_))));
        assert!(matches!(long, Err(ValueObjectError::InvalidRoomId(_))));
        assert!(matches!(control, Err(ValueObjectError::InvalidRoomId(_))));
    }

    #[test]
    fn test_display_name_defaults_and_truncates() {
        // テスト項目: 空の表示名は Anonymous になり、長い名前は切り詰められる
        // given (前提条件):
        let long = "n".repeat(DISPLAY_NAME_MAX_LEN + 10);

        // when (操作):
        let blank = DisplayName::new("  ");
        let truncated = DisplayName::new(&long);

        // then (期待する結果):
        assert_eq!(blank.as_str(), ANONYMOUS_NAME);
        assert_eq!(truncated.as_str().chars().count(), DISPLAY_NAME_MAX_LEN);
    }

    #[test]
    fn test_max_users_range() {
        // テスト項目: 定員は既定値 20 で、2〜60 の範囲外はエラーになる
        // given (前提条件) / when (操作):
        let default = MaxUsers::new(None);
        let low = MaxUsers::new(Some(1));
        let high = MaxUsers::new(Some(100));
        let min = MaxUsers::new(Some(2));
        let max = MaxUsers::new(Some(60));

        // then (期待する結果):
        assert_eq!(default.unwrap().value(), 20);
        assert_eq!(low, Err(ValueObjectError::InvalidMaxUsers(1)));
        assert_eq!(high, Err(ValueObjectError::InvalidMaxUsers(100)));
        assert_eq!(min.unwrap().value(), 2);
        assert_eq!(max.unwrap().value(), 60);
    }

    #[test]
    fn test_connection_id_rejects_blank() {
        // テスト項目: 空の ConnectionId はエラーになる
        // given (前提条件) / when (操作):
        let result = ConnectionId::new(" ");

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::InvalidConnectionId));
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }
}
