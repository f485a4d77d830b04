//! UseCase: ルーム作成

use std::sync::Arc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::{
    domain::{ConnectionId, DisplayName, MaxUsers, Participant, RoomError, RoomId},
    infrastructure::dto::{conversion, websocket::ServerMessage},
};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl CreateRoomUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// ルームを作成し、作成者をホストとして参加させる
    ///
    /// 作成者には `room-created` と `you-are-host` が届きます。
    pub async fn execute(
        &self,
        requester: &ConnectionId,
        room_name: &str,
        password: &str,
        user_name: &str,
        max_users: Option<usize>,
    ) -> Result<RoomId, RoomError> {
        let id = RoomId::new(room_name)?;
        if password.is_empty() {
            return Err(RoomError::InvalidInput("a password is required".to_string()));
        }

        let name = DisplayName::new(user_name);
        let creator = Participant::new(requester.clone(), name.clone(), self.registry.now());
        let (_room, session) = self
            .registry
            .create(
                id.clone(),
                room_name.trim(),
                password,
                MaxUsers::new(max_users)?,
                creator,
            )
            .await?;

        self.broadcaster
            .send(
                requester,
                &ServerMessage::RoomCreated(conversion::welcome(&session, requester)),
            )
            .await;
        self.broadcaster
            .send(requester, &ServerMessage::YouAreHost)
            .await;
        self.broadcaster.roster(&session).await;
        self.broadcaster
            .activity(&session, format!("{} created the room", name))
            .await;

        tracing::info!(
            "Client '{}' created room '{}' (max {} users)",
            requester,
            id,
            session.max_users.value()
        );
        Ok(id)
    }
}
