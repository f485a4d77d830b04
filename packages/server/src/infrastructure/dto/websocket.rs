//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{"type": "<kebab-case tag>", "payload": {...}}`;
//! payload fields are camelCase. Tags without data omit `payload`.

use serde::{Deserialize, Serialize};
use shadowpad_shared::cipher::PadHead;

use crate::domain::Capability;

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        room_name: String,
        password: String,
        user_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_users: Option<usize>,
    },
    JoinRoom {
        room_id: String,
        password: String,
        user_name: String,
    },
    LeaveRoom {
        room_id: String,
    },
    UpdateText {
        room_id: String,
        content: String,
    },
    Typing {
        room_id: String,
    },
    UploadFile {
        room_id: String,
        file: UploadedFileDto,
    },
    DeleteFile {
        room_id: String,
        file_id: String,
    },
    DownloadFile {
        room_id: String,
        file_id: String,
    },
    UpdatePermissions {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allow_edit: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allow_upload: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allow_delete: Option<bool>,
    },
    /// `value: null` clears the override.
    ToggleUserPermission {
        room_id: String,
        user_id: String,
        permission: Capability,
        #[serde(default)]
        value: Option<bool>,
    },
    PromoteHost {
        room_id: String,
        user_id: String,
    },
    HostKickUser {
        room_id: String,
        user_id: String,
    },
}

impl ClientMessage {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::CreateRoom { .. } => "create-room",
            ClientMessage::JoinRoom { .. } => "join-room",
            ClientMessage::LeaveRoom { .. } => "leave-room",
            ClientMessage::UpdateText { .. } => "update-text",
            ClientMessage::Typing { .. } => "typing",
            ClientMessage::UploadFile { .. } => "upload-file",
            ClientMessage::DeleteFile { .. } => "delete-file",
            ClientMessage::DownloadFile { .. } => "download-file",
            ClientMessage::UpdatePermissions { .. } => "update-permissions",
            ClientMessage::ToggleUserPermission { .. } => "toggle-user-permission",
            ClientMessage::PromoteHost { .. } => "promote-host",
            ClientMessage::HostKickUser { .. } => "host-kick-user",
        }
    }
}

/// File as uploaded by a client. `content` is standard base64, optionally
/// as a `data:<mime>;base64,` URL. The declared `size` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileDto {
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: usize,
    pub content: String,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    RoomCreated(RoomWelcomeDto),
    JoinedSuccessfully(RoomWelcomeDto),
    ErrorMsg { reason: String },
    YouAreHost,
    UpdateUserList { users: Vec<UserDto> },
    UpdateFileList { files: Vec<FileMetaDto> },
    TextSynced { content: String },
    UpdatePermissions(PermissionsDto),
    ActivityLog { message: String, timestamp: i64 },
    Kicked,
    UserTyping { user_id: String, user_name: String },
    FileContent(FileContentDto),
    /// A new snapshot was stored; members continue the chain from here.
    PadSaved(PadHead),
}

/// Snapshot sent to a connection right after it creates or joins a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomWelcomeDto {
    pub room_id: String,
    pub room_name: String,
    /// The receiving connection's own id.
    pub user_id: String,
    pub is_host: bool,
    pub max_users: usize,
    pub content: String,
    pub users: Vec<UserDto>,
    pub files: Vec<FileMetaDto>,
    /// The receiver's effective capabilities.
    pub permissions: PermissionsDto,
    /// Room-wide defaults.
    pub room_permissions: PermissionsDto,
    /// Newest stored snapshot, absent until the pad is first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_head: Option<PadHead>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    /// Effective capabilities of this user.
    pub permissions: PermissionsDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsDto {
    pub allow_edit: bool,
    pub allow_upload: bool,
    pub allow_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetaDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContentDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: usize,
    /// Standard base64.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_room() {
        // テスト項目: create-room メッセージを camelCase のペイロードから読み取れる
        // given (前提条件):
        let json = r#"{"type":"create-room","payload":{"roomName":"Alpha","password":"pw","userName":"alice","maxUsers":2}}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                room_name: "Alpha".to_string(),
                password: "pw".to_string(),
                user_name: "alice".to_string(),
                max_users: Some(2),
            }
        );
        assert_eq!(msg.kind(), "create-room");
    }

    #[test]
    fn test_parse_toggle_with_null_value() {
        // テスト項目: toggle-user-permission の value に null を指定できる
        // given (前提条件):
        let json = r#"{"type":"toggle-user-permission","payload":{"roomId":"A","userId":"u1","permission":"delete","value":null}}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::ToggleUserPermission {
                room_id: "A".to_string(),
                user_id: "u1".to_string(),
                permission: Capability::Delete,
                value: None,
            }
        );
    }

    #[test]
    fn test_parse_partial_update_permissions() {
        // テスト項目: update-permissions は一部のフィールドだけでも受け付ける
        // given (前提条件):
        let json = r#"{"type":"update-permissions","payload":{"roomId":"A","allowDelete":true}}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::UpdatePermissions {
                room_id: "A".to_string(),
                allow_edit: None,
                allow_upload: None,
                allow_delete: Some(true),
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        // テスト項目: 未知の type はパースエラーになる
        // given (前提条件):
        let json = r#"{"type":"drop-tables","payload":{}}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientMessage>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        // テスト項目: サーバーメッセージが type/payload 形式で出力される
        // given (前提条件):
        let error = ServerMessage::ErrorMsg {
            reason: "Room is full".to_string(),
        };
        let typing = ServerMessage::UserTyping {
            user_id: "u1".to_string(),
            user_name: "bob".to_string(),
        };

        // when (操作):
        let error_json: serde_json::Value = serde_json::to_value(&error).unwrap();
        let typing_json: serde_json::Value = serde_json::to_value(&typing).unwrap();
        let kicked_json: serde_json::Value = serde_json::to_value(ServerMessage::Kicked).unwrap();
        let saved_json: serde_json::Value = serde_json::to_value(ServerMessage::PadSaved(PadHead {
            salt: [0; 16],
            step: 3,
        }))
        .unwrap();

        // then (期待する結果):
        assert_eq!(
            error_json,
            serde_json::json!({"type": "error-msg", "payload": {"reason": "Room is full"}})
        );
        assert_eq!(
            typing_json,
            serde_json::json!({"type": "user-typing", "payload": {"userId": "u1", "userName": "bob"}})
        );
        assert_eq!(kicked_json, serde_json::json!({"type": "kicked"}));
        assert_eq!(
            saved_json,
            serde_json::json!({"type": "pad-saved", "payload": {
                "salt": "AAAAAAAAAAAAAAAAAAAAAA==", "step": 3
            }})
        );
    }
}
