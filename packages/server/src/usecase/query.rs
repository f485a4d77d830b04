//! UseCase: ルーム情報の参照（HTTP API 用）

use std::sync::Arc;

use crate::domain::{RoomError, RoomId, RoomRepository, RoomSnapshot};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 常駐中の全ルームのスナップショット（id 順）
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        let mut snapshots = Vec::new();
        for room in self.repository.list().await {
            let session = room.lock().await;
            if !session.is_destroyed() {
                snapshots.push(session.snapshot());
            }
        }
        snapshots.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        snapshots
    }
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_id: &str) -> Result<RoomSnapshot, RoomError> {
        let id = RoomId::new(room_id).map_err(|_| RoomError::RoomNotFound)?;
        let room = self
            .repository
            .find(&id)
            .await
            .ok_or(RoomError::RoomNotFound)?;
        let session = room.lock().await;
        if session.is_destroyed() {
            return Err(RoomError::RoomNotFound);
        }
        Ok(session.snapshot())
    }
}
