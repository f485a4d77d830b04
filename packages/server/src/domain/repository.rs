//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセス・通知・永続化のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::sync::Arc;

use async_trait::async_trait;
use shadowpad_shared::cipher::EncryptedPayload;
use tokio::sync::{Mutex, mpsc};

use super::{
    entity::RoomSession,
    error::{MessagePushError, PadStoreError, RepositoryError},
    value_object::{ConnectionId, RoomId, Timestamp},
};

/// A resident room. Every mutation of a room happens while holding its lock,
/// which also orders that room's broadcasts.
pub type SharedRoom = Arc<Mutex<RoomSession>>;

/// Room Repository trait
///
/// 常駐中のルームを id で引くためのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 常駐中のルームを取得
    async fn find(&self, id: &RoomId) -> Option<SharedRoom>;

    /// ルームを登録（同じ id が常駐中ならエラー）
    async fn insert(&self, id: RoomId, room: SharedRoom) -> Result<(), RepositoryError>;

    /// ルームを登録解除
    ///
    /// `room` と同じインスタンスが登録されている場合だけ削除します。
    async fn remove(&self, id: &RoomId, room: &SharedRoom) -> bool;

    /// 常駐中の全ルーム
    async fn list(&self) -> Vec<SharedRoom>;

    /// 常駐中のルーム数
    async fn count(&self) -> usize;
}

/// 各クライアントへの送信キュー
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// クライアントへのメッセージ送信を抽象化します。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// クライアントを登録解除（送信キューが閉じ、接続も閉じられる）
    async fn unregister_client(&self, client_id: &ConnectionId);

    /// 特定のクライアントにメッセージを送信
    async fn push_to(&self, client_id: &ConnectionId, content: &str)
    -> Result<(), MessagePushError>;

    /// 複数のクライアントにメッセージをブロードキャスト
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}

/// 永続化されたパッド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPad {
    pub room_id: RoomId,
    pub payload: EncryptedPayload,
    pub last_active: Timestamp,
}

/// PadStore trait
///
/// 暗号化済みパッドの永続化先。中身は常に暗号文で、サーバーは復号しません。
/// 最終アクティブ時刻から保持期間を過ぎたレコードは存在しないものとして扱います。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PadStore: Send + Sync {
    /// 保存（上書き）し、最終アクティブ時刻を更新
    async fn save(&self, room_id: &RoomId, payload: &EncryptedPayload)
    -> Result<(), PadStoreError>;

    /// 読み込み（存在しない・期限切れなら `None`）
    async fn load(&self, room_id: &RoomId) -> Result<Option<StoredPad>, PadStoreError>;

    /// 最終アクティブ時刻だけを更新
    async fn touch(&self, room_id: &RoomId) -> Result<(), PadStoreError>;

    /// 削除（レコードがあった場合は true）
    async fn delete(&self, room_id: &RoomId) -> Result<bool, PadStoreError>;

    /// 期限切れのレコードを削除し、削除件数を返す
    async fn purge_expired(&self) -> Result<usize, PadStoreError>;
}
