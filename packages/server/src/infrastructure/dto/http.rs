//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};
use shadowpad_shared::cipher::EncryptedPayload;

/// Body of `POST /api/save-pad`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePadRequest {
    pub room_id: String,
    pub password: String,
    pub payload: EncryptedPayload,
}

/// Body of `DELETE /api/delete-pad`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePadRequest {
    pub room_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Room summary for the room list API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub user_count: usize,
    pub max_users: usize,
    pub created_at: String,
}

/// Room detail for the room detail API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub name: String,
    pub max_users: usize,
    pub created_at: String,
    pub users: Vec<RoomUserDto>,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUserDto {
    pub id: String,
    pub name: String,
    pub is_host: bool,
}
