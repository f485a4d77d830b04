//! PadStore 実装
//!
//! - `inmemory`: プロセス内の HashMap（`--data-dir` 未指定時・テスト用）
//! - `file`: 1 パッド 1 JSON ファイルのディレクトリ

mod file;
mod inmemory;

use serde::{Deserialize, Serialize};
use shadowpad_shared::cipher::EncryptedPayload;

use crate::domain::{RoomId, StoredPad, Timestamp};

pub use file::FilePadStore;
pub use inmemory::InMemoryPadStore;

/// Default inactivity window after which a stored pad expires.
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

/// On-disk / in-memory form of a stored pad.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PadRecord {
    room_id: RoomId,
    payload: EncryptedPayload,
    last_active: i64,
}

impl PadRecord {
    fn is_expired(&self, now: i64, retention_millis: i64) -> bool {
        now.saturating_sub(self.last_active) > retention_millis
    }
}

impl From<PadRecord> for StoredPad {
    fn from(record: PadRecord) -> Self {
        Self {
            room_id: record.room_id,
            payload: record.payload,
            last_active: Timestamp::new(record.last_active),
        }
    }
}

fn retention_millis(retention: std::time::Duration) -> i64 {
    i64::try_from(retention.as_millis()).unwrap_or(i64::MAX)
}
