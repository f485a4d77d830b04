//! UseCase 層
//!
//! プロトコルの操作ごとに 1 つのユースケースを置きます。ルームの生成・復元・破棄は
//! `RoomRegistry`、ルームへの通知は `RoomBroadcaster` にまとめています。

mod attachment;
mod broadcast;
mod create_room;
mod edit_content;
mod host_control;
mod join_room;
mod leave_room;
mod pad;
mod purge_pads;
mod query;
mod registry;
mod update_permissions;

#[cfg(test)]
mod test_support;

pub use attachment::{AttachmentUseCase, DEFAULT_MAX_UPLOAD_BYTES};
pub use broadcast::RoomBroadcaster;
pub use create_room::CreateRoomUseCase;
pub use edit_content::EditContentUseCase;
pub use host_control::HostControlUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::{LeaveReason, LeaveRoomUseCase};
pub use pad::PadUseCase;
pub use purge_pads::PurgeExpiredPadsUseCase;
pub use query::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use registry::{ResolvedRoom, RoomGuard, RoomRegistry};
pub use update_permissions::UpdatePermissionsUseCase;
