//! 権限判定
//!
//! 「このユーザーは X をしてよいか」の判定はすべてここに集約します。
//! 実効値は「個別上書きがあればそれ、なければルーム既定値」で、ホストは常に
//! すべての権限を持ちます。

use super::{
    entity::{Permissions, RoomSession},
    error::RoomError,
    value_object::{Capability, ConnectionId},
};

/// True when `id` is a member and currently holds the host role.
pub fn is_host(session: &RoomSession, id: &ConnectionId) -> bool {
    session.host_id.as_ref() == Some(id) && session.is_member(id)
}

/// Effective value of `cap` for `id`. Non-members have no capabilities.
pub fn check(session: &RoomSession, id: &ConnectionId, cap: Capability) -> bool {
    let Some(participant) = session.participant(id) else {
        return false;
    };
    if is_host(session, id) {
        return true;
    }
    participant
        .overrides
        .get(cap)
        .unwrap_or_else(|| session.permissions.get(cap))
}

/// All three effective capabilities for `id`, or `None` for non-members.
pub fn effective(session: &RoomSession, id: &ConnectionId) -> Option<Permissions> {
    session.participant(id)?;
    Some(Permissions {
        allow_edit: check(session, id, Capability::Edit),
        allow_upload: check(session, id, Capability::Upload),
        allow_delete: check(session, id, Capability::Delete),
    })
}

pub fn require(session: &RoomSession, id: &ConnectionId, cap: Capability) -> Result<(), RoomError> {
    if check(session, id, cap) {
        Ok(())
    } else {
        Err(RoomError::Forbidden(format!("you do not have {} permission", cap)))
    }
}

fn require_host(session: &RoomSession, id: &ConnectionId) -> Result<(), RoomError> {
    if is_host(session, id) {
        Ok(())
    } else {
        Err(RoomError::Forbidden(
            "only the host can change permissions".to_string(),
        ))
    }
}

/// Change a room-wide default.
pub fn set_room_permission(
    session: &mut RoomSession,
    requester: &ConnectionId,
    cap: Capability,
    value: bool,
) -> Result<(), RoomError> {
    require_host(session, requester)?;
    session.permissions.set(cap, value);
    Ok(())
}

/// Change several room-wide defaults at once; absent fields are left alone.
/// Either every change applies or none does.
pub fn set_room_permissions(
    session: &mut RoomSession,
    requester: &ConnectionId,
    edit: Option<bool>,
    upload: Option<bool>,
    delete: Option<bool>,
) -> Result<(), RoomError> {
    require_host(session, requester)?;
    for (cap, value) in [
        (Capability::Edit, edit),
        (Capability::Upload, upload),
        (Capability::Delete, delete),
    ] {
        if let Some(value) = value {
            session.permissions.set(cap, value);
        }
    }
    Ok(())
}

/// Set or clear (`None`) a per-user override.
pub fn set_user_permission(
    session: &mut RoomSession,
    requester: &ConnectionId,
    target: &ConnectionId,
    cap: Capability,
    value: Option<bool>,
) -> Result<(), RoomError> {
    require_host(session, requester)?;
    let participant = session
        .participant_mut(target)
        .ok_or_else(|| RoomError::NotFound("User".to_string()))?;
    participant.overrides.set(cap, value);
    Ok(())
}
