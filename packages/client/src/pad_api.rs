//! HTTP calls for storing and deleting pads.

use reqwest::Response;
use shadowpad_server::infrastructure::dto::http::{DeletePadRequest, ErrorResponse, SavePadRequest};
use shadowpad_shared::cipher::EncryptedPayload;

use crate::error::ClientError;

/// Client for `/api/save-pad` and `/api/delete-pad`.
#[derive(Debug, Clone)]
pub struct PadApi {
    http: reqwest::Client,
    base_url: String,
}

impl PadApi {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn save(
        &self,
        room_id: &str,
        password: &str,
        payload: EncryptedPayload,
    ) -> Result<(), ClientError> {
        let body = SavePadRequest {
            room_id: room_id.to_string(),
            password: password.to_string(),
            payload,
        };
        let response = self
            .http
            .post(format!("{}/api/save-pad", self.base_url))
            .json(&body)
            .send()
            .await?;
        check(response).await
    }

    pub async fn delete(&self, room_id: &str, password: &str) -> Result<(), ClientError> {
        let body = DeletePadRequest {
            room_id: room_id.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .delete(format!("{}/api/delete-pad", self.base_url))
            .json(&body)
            .send()
            .await?;
        check(response).await
    }
}

async fn check(response: Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures_util::{SinkExt, StreamExt};
    use shadowpad_server::{
        infrastructure::{
            dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
            pad_store::InMemoryPadStore, repository::InMemoryRoomRepository,
        },
        ui::{AppState, Server},
        usecase::DEFAULT_MAX_UPLOAD_BYTES,
    };
    use shadowpad_shared::{cipher::RatchetState, time::SystemClock};
    use tokio::net::TcpListener;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    use super::*;

    async fn start_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let clock = Arc::new(SystemClock);
        let state = AppState::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(InMemoryPadStore::new(clock.clone(), Duration::from_secs(3600))),
            clock,
            DEFAULT_MAX_UPLOAD_BYTES,
        );
        tokio::spawn(Server::new(state).serve(listener, std::future::pending()));
        addr.to_string()
    }

    /// Open a room and keep its socket alive for the duration of the test.
    async fn open_room(
        addr: &str,
        room: &str,
        password: &str,
    ) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>
    {
        let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        let frame = serde_json::json!({"type": "create-room", "payload": {
            "roomName": room, "password": password, "userName": "alice"
        }});
        ws.send(Message::Text(frame.to_string().into())).await.unwrap();
        loop {
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("connection closed before the room was created");
            };
            if let Ok(ServerMessage::RoomCreated(_)) = serde_json::from_str(text.as_str()) {
                return ws;
            }
        }
    }

    #[tokio::test]
    async fn test_save_with_room_password() {
        // テスト項目: ルームのパスワードでパッドを保存できる
        // given (前提条件):
        let addr = start_server().await;
        let _ws = open_room(&addr, "NOTES", "pw").await;
        let api = PadApi::new(format!("http://{}/", addr));
        let (payload, _) = RatchetState::init("pw", None)
            .unwrap()
            .encrypt("text")
            .unwrap();

        // when (操作):
        let result = api.save("NOTES", "pw", payload).await;

        // then (期待する結果):
        assert!(result.is_ok(), "{:?}", result);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        // テスト項目: 誤ったパスワードや存在しないルームはステータスとメッセージ付きで失敗する
        // given (前提条件):
        let addr = start_server().await;
        let _ws = open_room(&addr, "NOTES", "pw").await;
        let api = PadApi::new(format!("http://{}", addr));

        // when (操作):
        let wrong = api.delete("NOTES", "nope").await;
        let missing = api.delete("GHOST", "pw").await;

        // then (期待する結果):
        assert!(matches!(wrong, Err(ClientError::Api { status: 403, .. })));
        assert!(matches!(missing, Err(ClientError::Api { status: 404, .. })));
    }
}
