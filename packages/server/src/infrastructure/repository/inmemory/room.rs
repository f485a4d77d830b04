//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! マップ自体のロックはルームの検索・登録・削除の間だけ保持し、ルームの中身は
//! 各ルームの `Mutex` で保護します。ルームどうしは可変状態を共有しません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, RoomId, RoomRepository, SharedRoom};

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, SharedRoom>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find(&self, id: &RoomId) -> Option<SharedRoom> {
        let rooms = self.rooms.lock().await;
        rooms.get(id).cloned()
    }

    async fn insert(&self, id: RoomId, room: SharedRoom) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&id) {
            return Err(RepositoryError::RoomAlreadyExists(id.to_string()));
        }
        tracing::debug!("Room '{}' is now resident", id);
        rooms.insert(id, room);
        Ok(())
    }

    async fn remove(&self, id: &RoomId, room: &SharedRoom) -> bool {
        let mut rooms = self.rooms.lock().await;
        // 同じ id で作り直されたルームを誤って消さない
        match rooms.get(id) {
            Some(current) if Arc::ptr_eq(current, room) => {
                rooms.remove(id);
                tracing::debug!("Room '{}' is no longer resident", id);
                true
            }
            _ => false,
        }
    }

    async fn list(&self) -> Vec<SharedRoom> {
        let rooms = self.rooms.lock().await;
        rooms.values().cloned().collect()
    }

    async fn count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}
