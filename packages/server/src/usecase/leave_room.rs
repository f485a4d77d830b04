//! UseCase: ルーム退出
//!
//! 明示的な退出・切断・キックはすべてここを通ります。
//!
//! 1. 参加者を取り除く
//! 2. 誰も残っていなければルームを破棄する
//! 3. ホストが抜けた場合は最古参の参加者にホストを移す
//! 4. 参加者一覧とアクティビティを配信する

use std::sync::Arc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::{
    domain::{
        ConnectionId, HostTransition, RoomId, RoomSession, SharedRoom, host_migration,
    },
    infrastructure::dto::websocket::ServerMessage,
};

/// Why a participant is leaving; only changes the activity note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    Left,
    Disconnected,
    Kicked,
}

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl LeaveRoomUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// `requester` を `room_id` から退出させる
    ///
    /// メンバーでなければ何もしません（切断時の後始末で二重に呼ばれても安全）。
    pub async fn execute(&self, requester: &ConnectionId, room_id: &RoomId, reason: LeaveReason) {
        let Some((room, mut session)) = self.registry.lock(room_id).await else {
            return;
        };
        self.leave_locked(&room, &mut session, requester, reason).await;
    }

    /// Leave path for callers that already hold the room lock.
    ///
    /// Returns false when `member` was not in the room.
    pub async fn leave_locked(
        &self,
        room: &SharedRoom,
        session: &mut RoomSession,
        member: &ConnectionId,
        reason: LeaveReason,
    ) -> bool {
        let Some(departed) = session.remove_participant(member) else {
            return false;
        };
        tracing::info!(
            "Client '{}' left room '{}' ({:?})",
            member,
            session.id,
            reason
        );

        let transition = host_migration::migrate_after_leave(session);
        if transition == HostTransition::RoomEmpty {
            self.registry.destroy(room, session).await;
            return true;
        }

        let note = match reason {
            LeaveReason::Left => format!("{} left", departed.name),
            LeaveReason::Disconnected => format!("{} disconnected", departed.name),
            LeaveReason::Kicked => format!("{} was removed by the host", departed.name),
        };

        if let HostTransition::Migrated(new_host) = &transition {
            tracing::info!("Host of room '{}' migrated to '{}'", session.id, new_host);
            self.broadcaster
                .send(new_host, &ServerMessage::YouAreHost)
                .await;
            self.broadcaster.member_permissions(session, new_host).await;
        }
        self.broadcaster.roster(session).await;
        self.broadcaster.activity(session, note).await;
        if let HostTransition::Migrated(new_host) = &transition {
            if let Some(host) = session.participant(new_host) {
                let note = format!("{} is now the host", host.name);
                self.broadcaster.activity(session, note).await;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::{
        create_room::CreateRoomUseCase,
        join_room::JoinRoomUseCase,
        test_support::{Harness, Inbox},
    };

    async fn alpha_with_alice_and_bob(
        h: &Harness,
    ) -> (ConnectionId, ConnectionId, Inbox) {
        let create = CreateRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let join = JoinRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (alice, _a) = h.connect("alice").await;
        let (bob, mut bob_inbox) = h.connect("bob").await;
        create.execute(&alice, "ALPHA", "pw", "alice", Some(2)).await.unwrap();
        join.execute(&bob, "ALPHA", "pw", "bob").await.unwrap();
        bob_inbox.drain();
        (alice, bob, bob_inbox)
    }

    #[tokio::test]
    async fn test_host_leave_promotes_remaining_member() {
        // テスト項目: ホストが抜けると残った参加者がホストになり、you-are-host を受け取る
        // given (前提条件):
        let h = Harness::new();
        let (alice, bob, mut bob_inbox) = alpha_with_alice_and_bob(&h).await;
        let usecase = LeaveRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let id = RoomId::new("ALPHA").unwrap();

        // when (操作):
        usecase.execute(&alice, &id, LeaveReason::Disconnected).await;

        // then (期待する結果):
        let messages = bob_inbox.drain();
        assert_eq!(messages[0], ServerMessage::YouAreHost);
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::UpdateUserList { users } if users.len() == 1 && users[0].is_host
        )));
        let (_room, session) = h.registry.lock(&id).await.unwrap();
        assert_eq!(session.host_id, Some(bob));
        assert!(host_migration::holds_invariant(&session));
    }

    #[tokio::test]
    async fn test_last_leave_destroys_room() {
        // テスト項目: 最後の参加者が抜けるとルームが破棄される
        // given (前提条件):
        let h = Harness::new();
        let (alice, bob, _bob_inbox) = alpha_with_alice_and_bob(&h).await;
        let usecase = LeaveRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let id = RoomId::new("ALPHA").unwrap();

        // when (操作):
        usecase.execute(&bob, &id, LeaveReason::Left).await;
        usecase.execute(&alice, &id, LeaveReason::Left).await;

        // then (期待する結果):
        assert!(h.registry.lock(&id).await.is_none());
        assert_eq!(h.registry.repository().count().await, 0);
    }

    #[tokio::test]
    async fn test_leave_frees_a_slot() {
        // テスト項目: 満員のルームでも誰かが抜ければ再び参加できる
        // given (前提条件):
        let h = Harness::new();
        let (_alice, bob, _bob_inbox) = alpha_with_alice_and_bob(&h).await;
        let usecase = LeaveRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let join = JoinRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (carl, _c) = h.connect("carl").await;
        let id = RoomId::new("ALPHA").unwrap();
        assert_eq!(
            join.execute(&carl, "ALPHA", "pw", "carl").await,
            Err(crate::domain::RoomError::RoomFull)
        );

        // when (操作):
        usecase.execute(&bob, &id, LeaveReason::Left).await;
        let result = join.execute(&carl, "ALPHA", "pw", "carl").await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_leave_of_non_member_is_noop() {
        // テスト項目: メンバーでない接続の退出は何も起こさない
        // given (前提条件):
        let h = Harness::new();
        let (_alice, _bob, mut bob_inbox) = alpha_with_alice_and_bob(&h).await;
        let usecase = LeaveRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (stranger, _s) = h.connect("stranger").await;

        // when (操作):
        usecase
            .execute(&stranger, &RoomId::new("ALPHA").unwrap(), LeaveReason::Left)
            .await;

        // then (期待する結果):
        assert!(bob_inbox.drain().is_empty());
    }
}
