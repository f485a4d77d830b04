//! ホスト移譲
//!
//! 「参加者がいる限りホストはちょうど 1 人」という不変条件を、参加・退出・
//! 昇格のたびに維持します。
//!
//! ```text
//! NoHost ──admit──▶ ActiveHost ──host leaves──▶ Migrating ──▶ ActiveHost
//!                        │                          │
//!                        └──────── promote ─────────┘
//!                                                   └──(empty)──▶ Destroyed
//! ```

use super::{entity::RoomSession, error::RoomError, permission, value_object::ConnectionId};

/// Outcome of a departure as far as the host role is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTransition {
    /// The host is still present.
    Unchanged,
    /// The host left; the given participant holds the role now.
    Migrated(ConnectionId),
    /// Nobody is left; the room should be torn down.
    RoomEmpty,
}

/// Give the host role to `id` and take it away from everyone else.
///
/// Returns false when `id` is not a member; the room is left untouched.
pub fn assign_host(session: &mut RoomSession, id: &ConnectionId) -> bool {
    if !session.is_member(id) {
        return false;
    }
    for user in session.users.iter_mut() {
        user.is_host = &user.id == id;
    }
    session.host_id = Some(id.clone());
    true
}

/// Restore the invariant after a participant has been removed.
pub fn migrate_after_leave(session: &mut RoomSession) -> HostTransition {
    if session.users.is_empty() {
        session.host_id = None;
        return HostTransition::RoomEmpty;
    }

    let host_present = session
        .host_id
        .as_ref()
        .is_some_and(|host| session.is_member(host));
    if host_present {
        return HostTransition::Unchanged;
    }

    // users は参加順なので先頭が最古参
    let successor = session.users[0].id.clone();
    assign_host(session, &successor);
    HostTransition::Migrated(successor)
}

/// Hand the host role from `requester` to `target`.
pub fn promote(
    session: &mut RoomSession,
    requester: &ConnectionId,
    target: &ConnectionId,
) -> Result<(), RoomError> {
    if !permission::is_host(session, requester) {
        return Err(RoomError::Forbidden(
            "only the host can transfer host rights".to_string(),
        ));
    }
    if !session.is_member(target) {
        return Err(RoomError::NotFound("User".to_string()));
    }
    assign_host(session, target);
    Ok(())
}

/// Validate a kick request. The actual removal runs through the normal
/// leave path so host migration and broadcasts stay in one place.
pub fn authorize_kick(
    session: &RoomSession,
    requester: &ConnectionId,
    target: &ConnectionId,
) -> Result<(), RoomError> {
    if !permission::is_host(session, requester) {
        return Err(RoomError::Forbidden("only the host can kick users".to_string()));
    }
    if !session.is_member(target) {
        return Err(RoomError::NotFound("User".to_string()));
    }
    if requester == target {
        return Err(RoomError::InvalidInput("the host cannot kick themselves".to_string()));
    }
    Ok(())
}

/// True when the session satisfies the single-host invariant.
pub fn holds_invariant(session: &RoomSession) -> bool {
    if session.users.is_empty() {
        return session.host_id.is_none();
    }
    let hosts: Vec<_> = session.users.iter().filter(|u| u.is_host).collect();
    hosts.len() == 1 && session.host_id.as_ref() == Some(&hosts[0].id)
}
