//! ユースケースのテスト用ヘルパー

use std::{sync::Arc, time::Duration};

use shadowpad_shared::time::FixedClock;
use tokio::sync::mpsc;

use super::{broadcast::RoomBroadcaster, registry::RoomRegistry};
use crate::{
    domain::{ConnectionId, MessagePusher, PadStore},
    infrastructure::{
        dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
        pad_store::InMemoryPadStore, repository::InMemoryRoomRepository,
    },
};

pub struct Harness {
    pub registry: Arc<RoomRegistry>,
    pub broadcaster: Arc<RoomBroadcaster>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub pad_store: Arc<dyn PadStore>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(1_700_000_000_000));
        let pad_store: Arc<dyn PadStore> = Arc::new(InMemoryPadStore::new(
            clock.clone(),
            Duration::from_secs(30 * 24 * 60 * 60),
        ));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryRoomRepository::new()),
            pad_store.clone(),
            clock.clone(),
        ));
        let broadcaster = Arc::new(RoomBroadcaster::new(pusher.clone(), clock.clone()));
        Self {
            registry,
            broadcaster,
            pusher,
            pad_store,
            clock,
        }
    }

    /// Register a connection and return its id plus an inbox.
    pub async fn connect(&self, name: &str) -> (ConnectionId, Inbox) {
        let id = ConnectionId::new(format!("conn-{}", name)).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(id.clone(), tx).await;
        (id, Inbox(rx))
    }
}

pub struct Inbox(mpsc::UnboundedReceiver<String>);

impl Inbox {
    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(json) = self.0.try_recv() {
            messages.push(serde_json::from_str(&json).unwrap());
        }
        messages
    }

    pub fn is_closed(&mut self) -> bool {
        matches!(
            self.0.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}
