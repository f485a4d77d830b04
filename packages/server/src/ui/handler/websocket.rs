//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, MessagePusher},
    infrastructure::dto::websocket::ServerMessage,
    ui::{
        gateway::{self, ConnectionContext},
        state::AppState,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let limit = state.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The channel closes when the connection is unregistered from the pusher
/// (disconnect or kick); the socket is closed right after.
/// How long queued frames may take to flush after the connection is torn down.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    state
        .broadcaster
        .message_pusher()
        .register_client(client_id.clone(), tx)
        .await;
    tracing::info!("Client '{}' connected", client_id);

    let mut send_task = pusher_loop(rx, sender);
    let mut ctx = ConnectionContext::new(client_id);
    let mut writer_done = false;

    // フレームの処理中には中断しない。待機中に送信側が終われば抜ける
    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = &mut send_task => {
                writer_done = true;
                break;
            }
        };
        let msg = match frame {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error from '{}': {}", ctx.id, e);
                // 上限超過などで読み取れなくなった。理由だけは届けてから閉じる
                let error = ServerMessage::ErrorMsg {
                    reason: format!("Connection closed: {}", e),
                };
                state.broadcaster.send(&ctx.id, &error).await;
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => gateway::handle_frame(&state, &mut ctx, text.as_str()).await,
            Message::Ping(_) => {
                tracing::debug!("Received ping");
                // Ping/pong is handled automatically by the WebSocket protocol
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", ctx.id);
                break;
            }
            _ => {}
        }
    }

    gateway::disconnect(&state, &ctx).await;
    if !writer_done
        && tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task)
            .await
            .is_err()
    {
        send_task.abort();
    }
    tracing::info!("Client '{}' disconnected", ctx.id);
}
