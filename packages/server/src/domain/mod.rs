//! ドメイン層
//!
//! ルーム・参加者・添付ファイルのエンティティと、それらに対する純粋なルール
//! （権限判定、ホスト移譲）を定義します。データストアや通知手段は trait として
//! ここで定義し、具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod entity;
pub mod error;
pub mod host_migration;
pub mod permission;
pub mod repository;
pub mod value_object;

pub use entity::{
    Attachment, Participant, PermissionOverrides, Permissions, RoomSession, RoomSnapshot,
};
pub use error::{MessagePushError, PadStoreError, RepositoryError, RoomError, ValueObjectError};
pub use host_migration::HostTransition;
pub use repository::{MessagePusher, PadStore, PusherChannel, RoomRepository, SharedRoom, StoredPad};
#[cfg(test)]
pub use repository::MockPadStore;
pub use value_object::{
    AttachmentId, Capability, ConnectionId, DisplayName, MaxUsers, RoomId, Timestamp,
};
