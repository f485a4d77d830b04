//! UseCase: 期限切れパッドの掃除

use std::sync::Arc;

use crate::domain::{PadStore, PadStoreError};

pub struct PurgeExpiredPadsUseCase {
    pad_store: Arc<dyn PadStore>,
}

impl PurgeExpiredPadsUseCase {
    pub fn new(pad_store: Arc<dyn PadStore>) -> Self {
        Self { pad_store }
    }

    /// 削除した件数を返す
    pub async fn execute(&self) -> Result<usize, PadStoreError> {
        let purged = self.pad_store.purge_expired().await?;
        if purged > 0 {
            tracing::info!("Purged {} expired pad(s)", purged);
        } else {
            tracing::debug!("No expired pads to purge");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockPadStore;

    #[tokio::test]
    async fn test_purge_reports_count() {
        // テスト項目: パッドストアが削除した件数をそのまま返す
        // given (前提条件):
        let mut store = MockPadStore::new();
        store.expect_purge_expired().times(1).returning(|| Ok(3));
        let usecase = PurgeExpiredPadsUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_purge_propagates_store_error() {
        // テスト項目: パッドストアの障害はそのまま返る
        // given (前提条件):
        let mut store = MockPadStore::new();
        store
            .expect_purge_expired()
            .returning(|| Err(PadStoreError::Io(std::io::Error::other("gone"))));
        let usecase = PurgeExpiredPadsUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert!(matches!(result, Err(PadStoreError::Io(_))));
    }
}
