//! UseCase: ホスト操作（移譲・キック）

use std::sync::Arc;

use super::{
    broadcast::RoomBroadcaster,
    leave_room::{LeaveReason, LeaveRoomUseCase},
    registry::RoomRegistry,
};
use crate::{
    domain::{ConnectionId, RoomError, RoomId, host_migration},
    infrastructure::dto::websocket::ServerMessage,
};

pub struct HostControlUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
    leave: Arc<LeaveRoomUseCase>,
}

impl HostControlUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        broadcaster: Arc<RoomBroadcaster>,
        leave: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            leave,
        }
    }

    /// ホスト権限を `target` に移す
    pub async fn promote(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        target: &str,
    ) -> Result<(), RoomError> {
        let target = ConnectionId::new(target)?;
        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        host_migration::promote(&mut session, requester, &target)?;
        tracing::info!("Room '{}': host transferred from '{}' to '{}'", room_id, requester, target);

        self.broadcaster
            .send(&target, &ServerMessage::YouAreHost)
            .await;
        self.broadcaster.permissions(&session).await;
        self.broadcaster.roster(&session).await;
        if let Some(host) = session.participant(&target) {
            let note = format!("{} is now the host", host.name);
            self.broadcaster.activity(&session, note).await;
        }
        Ok(())
    }

    /// `target` を強制退出させ、接続を閉じる
    ///
    /// 対象には `kicked` が届いた後に送信キューが閉じられます。退出処理は通常の
    /// leave と同じ経路で、ロックを保持したまま即座に行います。
    pub async fn kick(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        target: &str,
    ) -> Result<(), RoomError> {
        let target = ConnectionId::new(target)?;
        let (room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        host_migration::authorize_kick(&session, requester, &target)?;

        self.broadcaster.send(&target, &ServerMessage::Kicked).await;
        self.leave
            .leave_locked(&room, &mut session, &target, LeaveReason::Kicked)
            .await;
        drop(session);

        self.broadcaster
            .message_pusher()
            .unregister_client(&target)
            .await;
        tracing::info!("Client '{}' kicked from room '{}' by '{}'", target, room_id, requester);
        Ok(())
    }
}
