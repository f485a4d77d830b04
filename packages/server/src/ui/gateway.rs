//! Per-connection message dispatch.
//!
//! Every inbound frame is decoded into a [`ClientMessage`] and routed to
//! exactly one use case. Failures are reported to the originating connection
//! only, as an `error-msg` frame.

use crate::{
    domain::{ConnectionId, MessagePusher, RoomError, RoomId},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::LeaveReason,
};

/// What the gateway remembers about one WebSocket connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub id: ConnectionId,
    /// The room this connection last created or joined.
    pub room: Option<RoomId>,
}

impl ConnectionContext {
    pub fn new(id: ConnectionId) -> Self {
        Self { id, room: None }
    }
}

/// Handle one raw text frame.
pub async fn handle_frame(state: &AppState, ctx: &mut ConnectionContext, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Malformed message from '{}': {}", ctx.id, e);
            let error = RoomError::InvalidInput("malformed message".to_string());
            state.broadcaster.error(&ctx.id, &error).await;
            return;
        }
    };

    let kind = message.kind();
    tracing::debug!("Client '{}' sent '{}'", ctx.id, kind);
    if let Err(e) = dispatch(state, ctx, message).await {
        tracing::warn!("'{}' from '{}' failed: {}", kind, ctx.id, e);
        state.broadcaster.error(&ctx.id, &e).await;
    }
}

/// Route one decoded message to its use case.
pub async fn dispatch(
    state: &AppState,
    ctx: &mut ConnectionContext,
    message: ClientMessage,
) -> Result<(), RoomError> {
    match message {
        ClientMessage::CreateRoom {
            room_name,
            password,
            user_name,
            max_users,
        } => {
            let id = state
                .create_room_usecase
                .execute(&ctx.id, &room_name, &password, &user_name, max_users)
                .await?;
            enter(state, ctx, id).await;
        }
        ClientMessage::JoinRoom {
            room_id,
            password,
            user_name,
        } => {
            let id = state
                .join_room_usecase
                .execute(&ctx.id, &room_id, &password, &user_name)
                .await?;
            enter(state, ctx, id).await;
        }
        ClientMessage::LeaveRoom { room_id } => {
            let id = RoomId::new(&room_id)?;
            state
                .leave_room_usecase
                .execute(&ctx.id, &id, LeaveReason::Left)
                .await;
            if ctx.room.as_ref() == Some(&id) {
                ctx.room = None;
            }
        }
        ClientMessage::UpdateText { room_id, content } => {
            state
                .edit_content_usecase
                .update_text(&ctx.id, &RoomId::new(&room_id)?, content)
                .await?;
        }
        ClientMessage::Typing { room_id } => {
            state
                .edit_content_usecase
                .typing(&ctx.id, &RoomId::new(&room_id)?)
                .await?;
        }
        ClientMessage::UploadFile { room_id, file } => {
            state
                .attachment_usecase
                .upload(&ctx.id, &RoomId::new(&room_id)?, file)
                .await?;
        }
        ClientMessage::DeleteFile { room_id, file_id } => {
            state
                .attachment_usecase
                .delete(&ctx.id, &RoomId::new(&room_id)?, &file_id)
                .await?;
        }
        ClientMessage::DownloadFile { room_id, file_id } => {
            state
                .attachment_usecase
                .download(&ctx.id, &RoomId::new(&room_id)?, &file_id)
                .await?;
        }
        ClientMessage::UpdatePermissions {
            room_id,
            allow_edit,
            allow_upload,
            allow_delete,
        } => {
            state
                .update_permissions_usecase
                .set_room(
                    &ctx.id,
                    &RoomId::new(&room_id)?,
                    allow_edit,
                    allow_upload,
                    allow_delete,
                )
                .await?;
        }
        ClientMessage::ToggleUserPermission {
            room_id,
            user_id,
            permission,
            value,
        } => {
            state
                .update_permissions_usecase
                .set_user(&ctx.id, &RoomId::new(&room_id)?, &user_id, permission, value)
                .await?;
        }
        ClientMessage::PromoteHost { room_id, user_id } => {
            state
                .host_control_usecase
                .promote(&ctx.id, &RoomId::new(&room_id)?, &user_id)
                .await?;
        }
        ClientMessage::HostKickUser { room_id, user_id } => {
            state
                .host_control_usecase
                .kick(&ctx.id, &RoomId::new(&room_id)?, &user_id)
                .await?;
        }
    }
    Ok(())
}

/// Record the newly entered room, leaving the previous one if it differs.
async fn enter(state: &AppState, ctx: &mut ConnectionContext, id: RoomId) {
    if let Some(previous) = ctx.room.replace(id.clone())
        && previous != id
    {
        state
            .leave_room_usecase
            .execute(&ctx.id, &previous, LeaveReason::Left)
            .await;
    }
}

/// Connection closed: leave the current room and drop the outbound queue.
pub async fn disconnect(state: &AppState, ctx: &ConnectionContext) {
    if let Some(room) = &ctx.room {
        state
            .leave_room_usecase
            .execute(&ctx.id, room, LeaveReason::Disconnected)
            .await;
    }
    state
        .broadcaster
        .message_pusher()
        .unregister_client(&ctx.id)
        .await;
}
