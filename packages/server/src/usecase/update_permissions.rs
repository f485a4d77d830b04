//! UseCase: 権限変更（ホスト専用）

use std::sync::Arc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::domain::{Capability, ConnectionId, RoomError, RoomId, permission};

pub struct UpdatePermissionsUseCase {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl UpdatePermissionsUseCase {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// ルーム既定値を変更し、各メンバーに自分の実効権限を配信する
    pub async fn set_room(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        allow_edit: Option<bool>,
        allow_upload: Option<bool>,
        allow_delete: Option<bool>,
    ) -> Result<(), RoomError> {
        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        permission::set_room_permissions(
            &mut session,
            requester,
            allow_edit,
            allow_upload,
            allow_delete,
        )?;
        tracing::info!(
            "Room '{}' permissions changed: {:?}",
            room_id,
            session.permissions
        );

        self.broadcaster.permissions(&session).await;
        self.broadcaster.roster(&session).await;
        Ok(())
    }

    /// 個別の上書きを設定（`None` で解除）する
    pub async fn set_user(
        &self,
        requester: &ConnectionId,
        room_id: &RoomId,
        target: &str,
        cap: Capability,
        value: Option<bool>,
    ) -> Result<(), RoomError> {
        let target = ConnectionId::new(target)?;
        let (_room, mut session) = self.registry.lock_as_member(room_id, requester).await?;
        permission::set_user_permission(&mut session, requester, &target, cap, value)?;
        tracing::info!(
            "Room '{}': {} override for '{}' set to {:?}",
            room_id,
            cap,
            target,
            value
        );

        self.broadcaster.member_permissions(&session, &target).await;
        self.broadcaster.roster(&session).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::dto::websocket::{PermissionsDto, ServerMessage},
        usecase::{
            create_room::CreateRoomUseCase, join_room::JoinRoomUseCase, test_support::Harness,
        },
    };

    #[tokio::test]
    async fn test_room_change_pushes_effective_values() {
        // テスト項目: ルーム既定値の変更で、各メンバーに自分の実効権限が届く（ホストは常に全権限）
        // given (前提条件):
        let h = Harness::new();
        let create = CreateRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let join = JoinRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let usecase = UpdatePermissionsUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (alice, mut alice_inbox) = h.connect("alice").await;
        let (bob, mut bob_inbox) = h.connect("bob").await;
        create.execute(&alice, "alpha", "pw", "alice", None).await.unwrap();
        join.execute(&bob, "alpha", "pw", "bob").await.unwrap();
        alice_inbox.drain();
        bob_inbox.drain();

        // when (操作):
        usecase
            .set_room(&alice, &RoomId::new("alpha").unwrap(), Some(false), None, Some(true))
            .await
            .unwrap();

        // then (期待する結果):
        let expected_bob = ServerMessage::UpdatePermissions(PermissionsDto {
            allow_edit: false,
            allow_upload: true,
            allow_delete: true,
        });
        let expected_alice = ServerMessage::UpdatePermissions(PermissionsDto {
            allow_edit: true,
            allow_upload: true,
            allow_delete: true,
        });
        assert!(bob_inbox.drain().contains(&expected_bob));
        assert!(alice_inbox.drain().contains(&expected_alice));
    }

    #[tokio::test]
    async fn test_guest_cannot_change_permissions() {
        // テスト項目: ゲストによる権限変更は Forbidden で、何も配信されない
        // given (前提条件):
        let h = Harness::new();
        let create = CreateRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let join = JoinRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let usecase = UpdatePermissionsUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (alice, mut alice_inbox) = h.connect("alice").await;
        let (bob, _b) = h.connect("bob").await;
        create.execute(&alice, "alpha", "pw", "alice", None).await.unwrap();
        join.execute(&bob, "alpha", "pw", "bob").await.unwrap();
        alice_inbox.drain();
        let id = RoomId::new("alpha").unwrap();

        // when (操作):
        let room = usecase.set_room(&bob, &id, None, None, Some(true)).await;
        let user = usecase
            .set_user(&bob, &id, bob.as_str(), Capability::Delete, Some(true))
            .await;

        // then (期待する結果):
        assert!(matches!(room, Err(RoomError::Forbidden(_))));
        assert!(matches!(user, Err(RoomError::Forbidden(_))));
        assert!(alice_inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_user_override_and_clear() {
        // テスト項目: 個別の上書きが対象者に届き、null で既定値に戻る
        // given (前提条件):
        let h = Harness::new();
        let create = CreateRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let join = JoinRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let usecase = UpdatePermissionsUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (alice, _a) = h.connect("alice").await;
        let (bob, mut bob_inbox) = h.connect("bob").await;
        create.execute(&alice, "alpha", "pw", "alice", None).await.unwrap();
        join.execute(&bob, "alpha", "pw", "bob").await.unwrap();
        bob_inbox.drain();
        let id = RoomId::new("alpha").unwrap();

        // when (操作):
        usecase
            .set_user(&alice, &id, bob.as_str(), Capability::Delete, Some(true))
            .await
            .unwrap();
        let granted = bob_inbox.drain();
        usecase
            .set_user(&alice, &id, bob.as_str(), Capability::Delete, None)
            .await
            .unwrap();
        let cleared = bob_inbox.drain();

        // then (期待する結果):
        assert!(granted.iter().any(|m| matches!(
            m,
            ServerMessage::UpdatePermissions(p) if p.allow_delete
        )));
        assert!(cleared.iter().any(|m| matches!(
            m,
            ServerMessage::UpdatePermissions(p) if !p.allow_delete
        )));
    }

    #[tokio::test]
    async fn test_override_for_unknown_user() {
        // テスト項目: 存在しない参加者への上書きは NotFound になる
        // given (前提条件):
        let h = Harness::new();
        let create = CreateRoomUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let usecase = UpdatePermissionsUseCase::new(h.registry.clone(), h.broadcaster.clone());
        let (alice, _a) = h.connect("alice").await;
        create.execute(&alice, "alpha", "pw", "alice", None).await.unwrap();

        // when (操作):
        let result = usecase
            .set_user(&alice, &RoomId::new("alpha").unwrap(), "ghost", Capability::Edit, Some(false))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RoomError::NotFound(_))));
    }
}
