//! UseCase: ルーム参加
//!
//! 常駐していないルームはパッドストアから復元されます。復元されたルームでは
//! 参加者がホストになり、その人のパスワードがルームのシークレットになります。

use std::sync::Arc;

use super::{
    broadcast::RoomBroadcaster,
    registry::{ResolvedRoom, RoomRegistry},
};
use crate::{
    domain::{ConnectionId, DisplayName, Participant, RoomError, RoomId},
    infrastructure::dto::{conversion, websocket::ServerMessage},
};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl JoinRoomUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    pub async fn execute(
        &self,
        requester: &ConnectionId,
        room_id: &str,
        password: &str,
        user_name: &str,
    ) -> Result<RoomId, RoomError> {
        let id = RoomId::new(room_id)?;
        if password.is_empty() {
            return Err(RoomError::InvalidInput("a password is required".to_string()));
        }

        let ResolvedRoom {
            room: _room,
            guard: mut session,
            restored,
        } = self.registry.resolve(&id, password).await?;

        let name = DisplayName::new(user_name);
        let participant = Participant::new(requester.clone(), name.clone(), self.registry.now());
        session.admit(participant, restored)?;

        let welcome = conversion::welcome(&session, requester);
        let is_host = welcome.is_host;
        self.broadcaster
            .send(requester, &ServerMessage::JoinedSuccessfully(welcome))
            .await;
        if is_host {
            self.broadcaster
                .send(requester, &ServerMessage::YouAreHost)
                .await;
        }
        self.broadcaster.roster(&session).await;
        self.broadcaster
            .activity(&session, format!("{} joined", name))
            .await;

        tracing::info!(
            "Client '{}' joined room '{}' ({}/{}){}",
            requester,
            id,
            session.users.len(),
            session.max_users.value(),
            if restored { " [restored]" } else { "" }
        );
        Ok(id)
    }
}
