//! ファイルベースの PadStore 実装
//!
//! `<data_dir>/<hex(room id)>.json` に 1 パッドずつ保存します。書き込みは一時
//! ファイルに書いてから rename するため、途中で落ちても壊れたレコードは残りません。

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use shadowpad_shared::{cipher::EncryptedPayload, time::Clock};
use tokio::{fs, sync::Mutex};

use super::{PadRecord, retention_millis};
use crate::domain::{PadStore, PadStoreError, RoomId, StoredPad};

const RECORD_EXTENSION: &str = "json";

pub struct FilePadStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    retention_millis: i64,
    /// 書き込み系の操作を直列化する
    write_lock: Mutex<()>,
}

impl FilePadStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub async fn open(
        dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        retention: Duration,
    ) -> Result<Self, PadStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        tracing::info!("Pad store directory: {}", dir.display());
        Ok(Self {
            dir,
            clock,
            retention_millis: retention_millis(retention),
            write_lock: Mutex::new(()),
        })
    }

    fn record_path(&self, room_id: &RoomId) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(room_id.as_str()), RECORD_EXTENSION))
    }

    async fn read_record(path: &Path) -> Result<Option<PadRecord>, PadStoreError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, path: &Path, record: &PadRecord) -> Result<(), PadStoreError> {
        let bytes = serde_json::to_vec(record)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl PadStore for FilePadStore {
    async fn save(
        &self,
        room_id: &RoomId,
        payload: &EncryptedPayload,
    ) -> Result<(), PadStoreError> {
        let _guard = self.write_lock.lock().await;
        let record = PadRecord {
            room_id: room_id.clone(),
            payload: payload.clone(),
            last_active: self.clock.now_millis(),
        };
        self.write_record(&self.record_path(room_id), &record).await?;
        tracing::debug!("Saved pad '{}' at step {}", room_id, payload.step);
        Ok(())
    }

    async fn load(&self, room_id: &RoomId) -> Result<Option<StoredPad>, PadStoreError> {
        let Some(record) = Self::read_record(&self.record_path(room_id)).await? else {
            return Ok(None);
        };
        if record.is_expired(self.clock.now_millis(), self.retention_millis) {
            return Ok(None);
        }
        Ok(Some(record.into()))
    }

    async fn touch(&self, room_id: &RoomId) -> Result<(), PadStoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(room_id);
        if let Some(mut record) = Self::read_record(&path).await? {
            record.last_active = self.clock.now_millis();
            self.write_record(&path, &record).await?;
        }
        Ok(())
    }

    async fn delete(&self, room_id: &RoomId) -> Result<bool, PadStoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.record_path(room_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn purge_expired(&self) -> Result<usize, PadStoreError> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now_millis();
        let mut purged = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let record = match Self::read_record(&path).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping unreadable pad record {}: {}", path.display(), e);
                    continue;
                }
            };
            if record.is_expired(now, self.retention_millis) {
                fs::remove_file(&path).await?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}
