//! ルームへの通知
//!
//! ユースケースはルームのロックを保持したままここを呼び出します。送信キューへの
//! 投入順がそのままルーム内の配信順になります。

use std::sync::Arc;

use shadowpad_shared::time::Clock;

use crate::{
    domain::{ConnectionId, MessagePusher, RoomError, RoomSession, permission},
    infrastructure::dto::{conversion, websocket::ServerMessage},
};

pub struct RoomBroadcaster {
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl RoomBroadcaster {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            message_pusher,
            clock,
        }
    }

    pub fn message_pusher(&self) -> &Arc<dyn MessagePusher> {
        &self.message_pusher
    }

    fn encode(message: &ServerMessage) -> Option<String> {
        match serde_json::to_string(message) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }

    /// Send to one connection. A vanished connection is not an error here.
    pub async fn send(&self, to: &ConnectionId, message: &ServerMessage) {
        let Some(json) = Self::encode(message) else {
            return;
        };
        if let Err(e) = self.message_pusher.push_to(to, &json).await {
            tracing::debug!("Dropped message for '{}': {}", to, e);
        }
    }

    pub async fn broadcast(&self, session: &RoomSession, message: &ServerMessage) {
        self.broadcast_to(session.member_ids(), message).await;
    }

    pub async fn broadcast_except(
        &self,
        session: &RoomSession,
        except: &ConnectionId,
        message: &ServerMessage,
    ) {
        let targets = session
            .member_ids()
            .into_iter()
            .filter(|id| id != except)
            .collect();
        self.broadcast_to(targets, message).await;
    }

    pub async fn broadcast_to(&self, targets: Vec<ConnectionId>, message: &ServerMessage) {
        if targets.is_empty() {
            return;
        }
        let Some(json) = Self::encode(message) else {
            return;
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Broadcast failed: {}", e);
        }
    }

    pub async fn roster(&self, session: &RoomSession) {
        let message = ServerMessage::UpdateUserList {
            users: conversion::user_list(session),
        };
        self.broadcast(session, &message).await;
    }

    pub async fn file_list(&self, session: &RoomSession) {
        let message = ServerMessage::UpdateFileList {
            files: conversion::file_list(session),
        };
        self.broadcast(session, &message).await;
    }

    /// Push each member its own effective capabilities.
    pub async fn permissions(&self, session: &RoomSession) {
        for user in &session.users {
            self.member_permissions(session, &user.id).await;
        }
    }

    pub async fn member_permissions(&self, session: &RoomSession, member: &ConnectionId) {
        if let Some(effective) = permission::effective(session, member) {
            self.send(member, &ServerMessage::UpdatePermissions(effective.into()))
                .await;
        }
    }

    pub async fn activity(&self, session: &RoomSession, message: impl Into<String>) {
        let message = ServerMessage::ActivityLog {
            message: message.into(),
            timestamp: self.clock.now_millis(),
        };
        self.broadcast(session, &message).await;
    }

    pub async fn error(&self, to: &ConnectionId, error: &RoomError) {
        let message = ServerMessage::ErrorMsg {
            reason: error.to_string(),
        };
        self.send(to, &message).await;
    }
}
