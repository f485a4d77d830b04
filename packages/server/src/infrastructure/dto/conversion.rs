//! Conversion logic between DTOs and domain entities.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use shadowpad_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    Attachment, ConnectionId, Permissions, RoomSession, RoomSnapshot, permission,
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

impl dto::UploadedFileDto {
    /// Decode the base64 body, accepting an optional `data:...;base64,` prefix.
    pub fn decode_content(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(strip_data_url(&self.content))
    }

    /// Upper bound on the decoded size, computed without decoding.
    pub fn estimated_size(&self) -> usize {
        strip_data_url(&self.content).len() / 4 * 3
    }
}

fn strip_data_url(content: &str) -> &str {
    match content.split_once(";base64,") {
        Some((prefix, body)) if prefix.starts_with("data:") => body,
        _ => content,
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<Permissions> for dto::PermissionsDto {
    fn from(p: Permissions) -> Self {
        Self {
            allow_edit: p.allow_edit,
            allow_upload: p.allow_upload,
            allow_delete: p.allow_delete,
        }
    }
}

impl From<&Attachment> for dto::FileMetaDto {
    fn from(file: &Attachment) -> Self {
        Self {
            id: file.id.to_string(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
        }
    }
}

impl From<&Attachment> for dto::FileContentDto {
    fn from(file: &Attachment) -> Self {
        Self {
            id: file.id.to_string(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            content: BASE64.encode(&file.bytes),
        }
    }
}

/// Roster with each member's effective capabilities, in join order.
pub fn user_list(session: &RoomSession) -> Vec<dto::UserDto> {
    session
        .users
        .iter()
        .map(|u| dto::UserDto {
            id: u.id.to_string(),
            name: u.name.to_string(),
            is_host: u.is_host,
            permissions: permission::effective(session, &u.id)
                .unwrap_or_default()
                .into(),
        })
        .collect()
}

pub fn file_list(session: &RoomSession) -> Vec<dto::FileMetaDto> {
    session.files.iter().map(dto::FileMetaDto::from).collect()
}

/// Snapshot for `viewer`, who must already be a member.
pub fn welcome(session: &RoomSession, viewer: &ConnectionId) -> dto::RoomWelcomeDto {
    dto::RoomWelcomeDto {
        room_id: session.id.to_string(),
        room_name: session.display_name.clone(),
        user_id: viewer.to_string(),
        is_host: permission::is_host(session, viewer),
        max_users: session.max_users.value(),
        content: session.content.clone(),
        users: user_list(session),
        files: file_list(session),
        permissions: permission::effective(session, viewer)
            .unwrap_or_default()
            .into(),
        room_permissions: session.permissions.into(),
        pad_head: session.pad_head,
    }
}

impl From<&RoomSnapshot> for http::RoomSummaryDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.display_name.clone(),
            user_count: room.users.len(),
            max_users: room.max_users.value(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&RoomSnapshot> for http::RoomDetailDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.display_name.clone(),
            max_users: room.max_users.value(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
            users: room
                .users
                .iter()
                .map(|u| http::RoomUserDto {
                    id: u.id.to_string(),
                    name: u.name.to_string(),
                    is_host: u.is_host,
                })
                .collect(),
            file_count: room.file_count,
        }
    }
}
