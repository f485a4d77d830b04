//! UseCase: パッドの保存・削除
//!
//! サーバーは暗号文を受け取って保存するだけで、中身は復号しません。
//! どちらの操作も常駐中のルームのパスワードで認証します。

use std::sync::Arc;

use shadowpad_shared::cipher::{EncryptedPayload, MAX_STEP, PadHead};

use super::{
    broadcast::RoomBroadcaster,
    registry::{RoomGuard, RoomRegistry, storage_error},
};
use crate::{
    domain::{RoomError, RoomId, SharedRoom},
    infrastructure::dto::websocket::ServerMessage,
};

pub struct PadUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl PadUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 暗号化済みのスナップショットを保存（上書き）する
    ///
    /// 保存済みの鎖を継がない暗号文（ソルト違い・step が進んでいない）は
    /// `StaleSnapshot` で拒否します。保存できたらメンバーに `pad-saved` が届きます。
    pub async fn save(
        &self,
        room_id: &str,
        password: &str,
        payload: &EncryptedPayload,
    ) -> Result<(), RoomError> {
        let id = RoomId::new(room_id)?;
        if payload.step == 0 || payload.step > MAX_STEP {
            return Err(RoomError::InvalidInput(format!(
                "ratchet step must be between 1 and {}",
                MAX_STEP
            )));
        }

        // 保存中に同じルームの他の操作が割り込まないようロックを保持する
        let (_room, mut session) = self.authenticate(&id, password).await?;
        let stored = self
            .registry
            .pad_store()
            .load(&id)
            .await
            .map_err(storage_error)?
            .map(|stored| PadHead::from(&stored.payload));
        // 期限切れで消えていても、常駐中のルームが覚えている鎖は守る
        if let Some(head) = stored.or(session.pad_head)
            && !head.is_followed_by(payload)
        {
            tracing::warn!(
                "Rejected save for pad '{}': step {} does not continue stored step {}",
                id,
                payload.step,
                head.step
            );
            return Err(RoomError::StaleSnapshot {
                stored_step: head.step,
            });
        }

        self.registry
            .pad_store()
            .save(&id, payload)
            .await
            .map_err(storage_error)?;
        let head = PadHead::from(payload);
        session.pad_head = Some(head);
        self.broadcaster
            .broadcast(&session, &ServerMessage::PadSaved(head))
            .await;
        tracing::info!(
            "Pad '{}' saved (step {}, {} bytes)",
            id,
            payload.step,
            payload.ciphertext.len()
        );
        Ok(())
    }

    /// 保存済みのパッドを削除し、常駐中のルームも閉じる
    ///
    /// メンバーにはアクティビティと `kicked` が届きます。
    pub async fn delete(&self, room_id: &str, password: &str) -> Result<(), RoomError> {
        let id = RoomId::new(room_id)?;
        let (room, mut session) = self.authenticate(&id, password).await?;

        let existed = self
            .registry
            .pad_store()
            .delete(&id)
            .await
            .map_err(storage_error)?;

        self.broadcaster
            .activity(&session, "The pad was deleted")
            .await;
        self.broadcaster
            .broadcast(&session, &ServerMessage::Kicked)
            .await;
        let members = self.registry.destroy(&room, &mut session).await;
        tracing::info!(
            "Pad '{}' deleted (stored: {}, {} members removed)",
            id,
            existed,
            members.len()
        );
        Ok(())
    }

    async fn authenticate(
        &self,
        id: &RoomId,
        password: &str,
    ) -> Result<(SharedRoom, RoomGuard), RoomError> {
        let (room, session) = self
            .registry
            .lock(id)
            .await
            .ok_or(RoomError::RoomNotFound)?;
        if !session.verify_secret(password) {
            tracing::warn!("Rejected pad request for '{}': wrong password", id);
            return Err(RoomError::IncorrectSecret);
        }
        Ok((room, session))
    }
}
