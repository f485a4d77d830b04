//! UseCase: 添付ファイル
//!
//! 上限を超えるファイルは切り詰めずに拒否します。サイズは宣言値ではなく
//! 復号後のバイト数で判定します。

use std::sync::Arc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::{
    domain::{
        Attachment, AttachmentId, Capability, ConnectionId, RoomError, RoomId, permission,
    },
    infrastructure::dto::websocket::{FileContentDto, ServerMessage, UploadedFileDto},
};

/// Default attachment ceiling (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Longest accepted file name, in characters.
const MAX_FILE_NAME_LEN: usize = 255;

pub struct AttachmentUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
    max_upload_bytes: usize,
}

impl AttachmentUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        broadcaster: Arc<RoomBroadcaster>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            max_upload_bytes,
        }
    }

    pub async fn upload(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        file: UploadedFileDto,
    ) -> Result<AttachmentId, RoomError> {
        let name = file.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_FILE_NAME_LEN {
            return Err(RoomError::InvalidInput("invalid file name".to_string()));
        }
        // 巨大な本文は復号する前に弾く
        let estimated = file.estimated_size();
        if estimated > self.max_upload_bytes + 2 {
            return Err(RoomError::PayloadTooLarge {
                size: estimated,
                limit: self.max_upload_bytes,
            });
        }
        let bytes = file
            .decode_content()
            .map_err(|_| RoomError::InvalidInput("file content is not valid base64".to_string()))?;
        if bytes.len() > self.max_upload_bytes {
            return Err(RoomError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_upload_bytes,
            });
        }
        let mime_type = if file.mime_type.trim().is_empty() {
            "application/octet-stream".to_string()
        } else {
            file.mime_type
        };

        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        permission::require(&session, requester, Capability::Upload)?;

        let attachment = Attachment::new(name, mime_type, bytes, self.registry.now());
        let id = attachment.id.clone();
        let note = match session.participant(requester) {
            Some(p) => format!("{} uploaded {}", p.name, attachment.name),
            None => format!("{} was uploaded", attachment.name),
        };
        tracing::info!(
            "Client '{}' uploaded '{}' to room '{}' ({} bytes)",
            requester,
            id,
            room_id,
            attachment.size
        );
        session.add_attachment(attachment);

        self.broadcaster.file_list(&session).await;
        self.broadcaster.activity(&session, note).await;
        Ok(id)
    }

    pub async fn delete(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        file_id: &str,
    ) -> Result<(), RoomError> {
        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        permission::require(&session, requester, Capability::Delete)?;

        let removed = session
            .remove_attachment(&AttachmentId::new(file_id))
            .ok_or_else(|| RoomError::NotFound("File".to_string()))?;
        let note = match session.participant(requester) {
            Some(p) => format!("{} deleted {}", p.name, removed.name),
            None => format!("{} was deleted", removed.name),
        };
        tracing::info!("Client '{}' deleted '{}' from room '{}'", requester, file_id, room_id);

        self.broadcaster.file_list(&session).await;
        self.broadcaster.activity(&session, note).await;
        Ok(())
    }

    /// 要求者にだけファイル本体を送る
    pub async fn download(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        file_id: &str,
    ) -> Result<(), RoomError> {
        let (_room, session) = self.registry.lock_as_member(room_id, requester).await?;
        let file = session
            .find_attachment(&AttachmentId::new(file_id))
            .ok_or_else(|| RoomError::NotFound("File".to_string()))?;
        self.broadcaster
            .send(requester, &ServerMessage::FileContent(FileContentDto::from(file)))
            .await;
        Ok(())
    }
}
