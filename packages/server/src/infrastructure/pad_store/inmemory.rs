//! InMemory PadStore 実装

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use shadowpad_shared::{cipher::EncryptedPayload, time::Clock};
use tokio::sync::Mutex;

use super::{PadRecord, retention_millis};
use crate::domain::{PadStore, PadStoreError, RoomId, StoredPad};

/// プロセス内にだけ保持する PadStore
pub struct InMemoryPadStore {
    records: Mutex<HashMap<RoomId, PadRecord>>,
    clock: Arc<dyn Clock>,
    retention_millis: i64,
}

impl InMemoryPadStore {
    pub fn new(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            retention_millis: retention_millis(retention),
        }
    }
}

#[async_trait]
impl PadStore for InMemoryPadStore {
    async fn save(
        &self,
        room_id: &RoomId,
        payload: &EncryptedPayload,
    ) -> Result<(), PadStoreError> {
        let mut records = self.records.lock().await;
        records.insert(
            room_id.clone(),
            PadRecord {
                room_id: room_id.clone(),
                payload: payload.clone(),
                last_active: self.clock.now_millis(),
            },
        );
        Ok(())
    }

    async fn load(&self, room_id: &RoomId) -> Result<Option<StoredPad>, PadStoreError> {
        let records = self.records.lock().await;
        let now = self.clock.now_millis();
        Ok(records
            .get(room_id)
            .filter(|r| !r.is_expired(now, self.retention_millis))
            .cloned()
            .map(StoredPad::from))
    }

    async fn touch(&self, room_id: &RoomId) -> Result<(), PadStoreError> {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(room_id) {
            record.last_active = self.clock.now_millis();
        }
        Ok(())
    }

    async fn delete(&self, room_id: &RoomId) -> Result<bool, PadStoreError> {
        let mut records = self.records.lock().await;
        Ok(records.remove(room_id).is_some())
    }

    async fn purge_expired(&self) -> Result<usize, PadStoreError> {
        let mut records = self.records.lock().await;
        let now = self.clock.now_millis();
        let before = records.len();
        records.retain(|_, r| !r.is_expired(now, self.retention_millis));
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowpad_shared::time::FixedClock;

    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn payload(step: u64) -> EncryptedPayload {
        EncryptedPayload {
            ciphertext: vec![1, 2, 3],
            iv: [7; 12],
            salt: [9; 16],
            step,
        }
    }

    fn store() -> (InMemoryPadStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_000));
        let store = InMemoryPadStore::new(clock.clone(), Duration::from_secs(30 * 24 * 60 * 60));
        (store, clock)
    }

    #[tokio::test]
    async fn test_save_then_load() {
        // テスト項目: 保存したパッドを読み込める
        // given (前提条件):
        let (store, _clock) = store();
        let id = RoomId::new("pad").unwrap();

        // when (操作):
        store.save(&id, &payload(1)).await.unwrap();
        store.save(&id, &payload(2)).await.unwrap();
        let loaded = store.load(&id).await.unwrap().unwrap();

        // then (期待する結果):
        assert_eq!(loaded.payload.step, 2);
        assert_eq!(loaded.last_active.value(), 1_000);
    }

    #[tokio::test]
    async fn test_expired_record_is_absent_and_purged() {
        // テスト項目: 保持期間を過ぎたパッドは読み込めず、掃除で削除される
        // given (前提条件):
        let (store, clock) = store();
        let id = RoomId::new("pad").unwrap();
        store.save(&id, &payload(1)).await.unwrap();

        // when (操作):
        clock.advance(31 * DAY);
        let loaded = store.load(&id).await.unwrap();
        let purged = store.purge_expired().await.unwrap();

        // then (期待する結果):
        assert!(loaded.is_none());
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn test_touch_extends_retention() {
        // テスト項目: touch すると保持期間が延長される
        // given (前提条件):
        let (store, clock) = store();
        let id = RoomId::new("pad").unwrap();
        store.save(&id, &payload(1)).await.unwrap();

        // when (操作):
        clock.advance(20 * DAY);
        store.touch(&id).await.unwrap();
        clock.advance(20 * DAY);

        // then (期待する結果):
        assert!(store.load(&id).await.unwrap().is_some());
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        // テスト項目: 削除したパッドは読み込めない
        // given (前提条件):
        let (store, _clock) = store();
        let id = RoomId::new("pad").unwrap();
        store.save(&id, &payload(1)).await.unwrap();

        // when (操作):
        let first = store.delete(&id).await.unwrap();
        let second = store.delete(&id).await.unwrap();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(store.load(&id).await.unwrap().is_none());
    }
}
