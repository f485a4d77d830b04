//! UseCase: 本文の編集と入力中通知
//!
//! 本文は文書全体の置き換えで、最後に書いた人が勝ちます（マージはしません）。

use std::sync::Arc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::{
    domain::{Capability, ConnectionId, RoomError, RoomId, permission},
    infrastructure::dto::websocket::ServerMessage,
};

pub struct EditContentUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl EditContentUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 本文を置き換え、送信者以外の全員に `text-synced` を配信する
    pub async fn update_text(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        content: String,
    ) -> Result<(), RoomError> {
        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        permission::require(&session, requester, Capability::Edit)?;

        tracing::debug!(
            "Client '{}' updated room '{}' ({} bytes)",
            requester,
            room_id,
            content.len()
        );
        session.replace_content(content.clone());
        self.broadcaster
            .broadcast_except(&session, requester, &ServerMessage::TextSynced { content })
            .await;
        Ok(())
    }

    /// 送信者以外の全員に `user-typing` を配信する
    pub async fn typing(&self, requester: &ConnectionId, room_id: &RoomId) -> Result<(), RoomError> {
        let (_room, session) = self.registry.lock_as_member(room_id, requester).await?;
        // 編集できない人の入力中表示は出さない
        if !permission::check(&session, requester, Capability::Edit) {
            return Ok(());
        }
        let Some(participant) = session.participant(requester) else {
            return Ok(());
        };
        let message = ServerMessage::UserTyping {
            user_id: requester.to_string(),
            user_name: participant.name.to_string(),
        };
        self.broadcaster
            .broadcast_except(&session, requester, &message)
            .await;
        Ok(())
    }
}
