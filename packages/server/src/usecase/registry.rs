//! ルームレジストリ
//!
//! 常駐ルームの生成・解決・破棄を一箇所にまとめます。
//!
//! ## 復元の直列化
//!
//! 常駐していないルームへの参加はパッドストアからの復元を伴い、I/O の間に他の
//! 接続の処理が割り込みます。同じ id の復元（と生成）はルーム id ごとのロックで
//! 直列化し、常駐セッションが二重にできないようにしています。

use std::{collections::HashMap, sync::Arc};

use shadowpad_shared::{cipher::PadHead, time::Clock};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    ConnectionId, MaxUsers, Participant, PadStore, PadStoreError, RoomError, RoomId,
    RoomRepository, RoomSession, SharedRoom, Timestamp,
};

/// Exclusive access to one resident room.
pub type RoomGuard = OwnedMutexGuard<RoomSession>;

/// A room handed out by [`RoomRegistry::resolve`], already locked.
pub struct ResolvedRoom {
    pub room: SharedRoom,
    pub guard: RoomGuard,
    /// True when the session was just rebuilt from the pad store.
    pub restored: bool,
}

pub struct RoomRegistry {
    repository: Arc<dyn RoomRepository>,
    pad_store: Arc<dyn PadStore>,
    clock: Arc<dyn Clock>,
    restore_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomRegistry {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        pad_store: Arc<dyn PadStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            pad_store,
            clock,
            restore_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    pub fn pad_store(&self) -> &Arc<dyn PadStore> {
        &self.pad_store
    }

    pub fn repository(&self) -> &Arc<dyn RoomRepository> {
        &self.repository
    }

    /// Create a room with `creator` as its sole member and host.
    ///
    /// Fails with `RoomExists` when the id is resident or has a stored pad.
    pub async fn create(
        &self,
        id: RoomId,
        display_name: &str,
        secret: &str,
        max_users: MaxUsers,
        creator: Participant,
    ) -> Result<(SharedRoom, RoomGuard), RoomError> {
        let id_lock = self.id_lock(&id).await;
        let _serialized = id_lock.lock().await;

        let result = async {
            if self.repository.find(&id).await.is_some() {
                return Err(RoomError::RoomExists);
            }
            if self.pad_store.load(&id).await.map_err(storage_error)?.is_some() {
                return Err(RoomError::RoomExists);
            }

            let mut session =
                RoomSession::new(id.clone(), display_name, secret, max_users, self.now());
            session.admit(creator, true)?;

            let room = Arc::new(Mutex::new(session));
            let guard = room.clone().lock_owned().await;
            self.repository
                .insert(id.clone(), room.clone())
                .await
                .map_err(|_| RoomError::RoomExists)?;
            tracing::info!("Room '{}' created", id);
            Ok((room, guard))
        }
        .await;

        self.release_id_lock(&id).await;
        result
    }

    /// Find a room for a joiner, restoring it from the pad store when it is
    /// not resident. The secret and capacity are checked under the room lock.
    pub async fn resolve(&self, id: &RoomId, secret: &str) -> Result<ResolvedRoom, RoomError> {
        loop {
            if let Some(room) = self.repository.find(id).await {
                let guard = room.clone().lock_owned().await;
                // 待っている間に破棄された
                if guard.is_destroyed() {
                    continue;
                }
                check_admission(&guard, secret)?;
                return Ok(ResolvedRoom {
                    room,
                    guard,
                    restored: false,
                });
            }

            if let Some(resolved) = self.restore(id, secret).await? {
                return Ok(resolved);
            }
        }
    }

    /// Restore under the per-id lock. `Ok(None)` means someone else made the
    /// room resident in the meantime and the caller should look again.
    async fn restore(&self, id: &RoomId, secret: &str) -> Result<Option<ResolvedRoom>, RoomError> {
        let id_lock = self.id_lock(id).await;
        let serialized = id_lock.lock().await;

        let result = async {
            if self.repository.find(id).await.is_some() {
                return Ok(None);
            }

            let stored = self
                .pad_store
                .load(id)
                .await
                .map_err(storage_error)?
                .ok_or(RoomError::RoomNotFound)?;
            let content = serde_json::to_string(&stored.payload).map_err(|e| {
                tracing::error!("Failed to encode stored pad '{}': {}", id, e);
                RoomError::Storage
            })?;

            let session = RoomSession::restored(
                id.clone(),
                content,
                PadHead::from(&stored.payload),
                secret,
                self.now(),
            );
            if let Err(e) = self.pad_store.touch(id).await {
                tracing::warn!("Failed to refresh retention for pad '{}': {}", id, e);
            }

            let room = Arc::new(Mutex::new(session));
            let guard = room.clone().lock_owned().await;
            self.repository
                .insert(id.clone(), room.clone())
                .await
                .map_err(|_| RoomError::RoomExists)?;
            tracing::info!("Room '{}' restored from pad store (step {})", id, stored.payload.step);
            Ok(Some(ResolvedRoom {
                room,
                guard,
                restored: true,
            }))
        }
        .await;

        drop(serialized);
        self.release_id_lock(id).await;
        result
    }

    /// Lock a resident room on behalf of one of its members.
    pub async fn lock_as_member(
        &self,
        id: &RoomId,
        member: &ConnectionId,
    ) -> Result<(SharedRoom, RoomGuard), RoomError> {
        let room = self
            .repository
            .find(id)
            .await
            .ok_or(RoomError::RoomNotFound)?;
        let guard = room.clone().lock_owned().await;
        if guard.is_destroyed() {
            return Err(RoomError::RoomNotFound);
        }
        if !guard.is_member(member) {
            return Err(RoomError::Forbidden("you are not in this room".to_string()));
        }
        Ok((room, guard))
    }

    /// Lock a resident room without a membership check.
    pub async fn lock(&self, id: &RoomId) -> Option<(SharedRoom, RoomGuard)> {
        let room = self.repository.find(id).await?;
        let guard = room.clone().lock_owned().await;
        if guard.is_destroyed() {
            return None;
        }
        Some((room, guard))
    }

    /// Tear a room down. Must be called with the room's lock held; returns the
    /// connections that were still members.
    pub async fn destroy(&self, room: &SharedRoom, session: &mut RoomSession) -> Vec<ConnectionId> {
        self.repository.remove(&session.id, room).await;
        let members = session.mark_destroyed();
        tracing::info!("Room '{}' destroyed", session.id);
        members
    }

    async fn id_lock(&self, id: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.restore_locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    async fn release_id_lock(&self, id: &RoomId) {
        let mut locks = self.restore_locks.lock().await;
        // map と呼び出し元しか持っていなければ、他に待っている人はいない
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) <= 2) {
            locks.remove(id);
        }
    }
}

fn check_admission(session: &RoomSession, secret: &str) -> Result<(), RoomError> {
    if !session.verify_secret(secret) {
        return Err(RoomError::IncorrectSecret);
    }
    if session.is_full() {
        return Err(RoomError::RoomFull);
    }
    Ok(())
}

pub(crate) fn storage_error(e: PadStoreError) -> RoomError {
    tracing::error!("Pad store error: {}", e);
    RoomError::Storage
}
