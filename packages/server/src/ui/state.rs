//! Shared application state.

use std::sync::Arc;

use shadowpad_shared::time::Clock;

use crate::{
    domain::{MessagePusher, PadStore, RoomRepository},
    usecase::{
        AttachmentUseCase, CreateRoomUseCase, EditContentUseCase, GetRoomDetailUseCase,
        GetRoomsUseCase, HostControlUseCase, JoinRoomUseCase, LeaveRoomUseCase, PadUseCase,
        PurgeExpiredPadsUseCase, RoomBroadcaster, RoomRegistry, UpdatePermissionsUseCase,
    },
};

/// Use cases shared by every connection and request.
pub struct AppState {
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub edit_content_usecase: Arc<EditContentUseCase>,
    pub attachment_usecase: Arc<AttachmentUseCase>,
    pub update_permissions_usecase: Arc<UpdatePermissionsUseCase>,
    pub host_control_usecase: Arc<HostControlUseCase>,
    pub pad_usecase: Arc<PadUseCase>,
    pub purge_pads_usecase: Arc<PurgeExpiredPadsUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Error frames and connection (un)registration.
    pub broadcaster: Arc<RoomBroadcaster>,
    /// Largest inbound WebSocket message, sized for a maximal upload.
    pub max_message_bytes: usize,
}

impl AppState {
    /// Wire every use case on top of the given infrastructure.
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        pad_store: Arc<dyn PadStore>,
        clock: Arc<dyn Clock>,
        max_upload_bytes: usize,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new(
            repository.clone(),
            pad_store.clone(),
            clock.clone(),
        ));
        let broadcaster = Arc::new(RoomBroadcaster::new(message_pusher, clock));
        let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
            registry.clone(),
            broadcaster.clone(),
        ));

        Self {
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                registry.clone(),
                broadcaster.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                registry.clone(),
                broadcaster.clone(),
            )),
            edit_content_usecase: Arc::new(EditContentUseCase::new(
                registry.clone(),
                broadcaster.clone(),
            )),
            attachment_usecase: Arc::new(AttachmentUseCase::new(
                registry.clone(),
                broadcaster.clone(),
                max_upload_bytes,
            )),
            update_permissions_usecase: Arc::new(UpdatePermissionsUseCase::new(
                registry.clone(),
                broadcaster.clone(),
            )),
            host_control_usecase: Arc::new(HostControlUseCase::new(
                registry.clone(),
                broadcaster.clone(),
                leave_room_usecase.clone(),
            )),
            pad_usecase: Arc::new(PadUseCase::new(registry, broadcaster.clone())),
            purge_pads_usecase: Arc::new(PurgeExpiredPadsUseCase::new(pad_store)),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(repository)),
            leave_room_usecase,
            broadcaster,
            max_message_bytes: transport_limit(max_upload_bytes),
        }
    }
}

/// Smallest frame the transport accepts regardless of the upload ceiling.
const MIN_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// WebSocket frame limit for a given upload ceiling.
///
/// Twice the base64 size of the ceiling plus room for the JSON envelope, so
/// an oversized file still reaches the upload use case and is answered with
/// `PayloadTooLarge` instead of a transport error.
fn transport_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(8)
        .div_ceil(3)
        .saturating_add(64 * 1024)
        .max(MIN_MESSAGE_BYTES)
}
