//! Integration tests that drive an in-process server over real sockets.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use shadowpad_server::{
    infrastructure::{
        dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
        pad_store::InMemoryPadStore, repository::InMemoryRoomRepository,
    },
    ui::{AppState, Server},
    usecase::DEFAULT_MAX_UPLOAD_BYTES,
};
use shadowpad_shared::{
    cipher::{
        EncryptedPayload, PadHead, RatchetState, UNREADABLE_PLACEHOLDER, decrypt_or_placeholder,
    },
    time::SystemClock,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Start a server on an ephemeral port
async fn start_server() -> SocketAddr {
    start_server_with_upload_limit(DEFAULT_MAX_UPLOAD_BYTES).await
}

async fn start_server_with_upload_limit(max_upload_bytes: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let clock = Arc::new(SystemClock);
    let state = AppState::new(
        Arc::new(InMemoryRoomRepository::new()),
        Arc::new(WebSocketMessagePusher::new()),
        Arc::new(InMemoryPadStore::new(clock.clone(), Duration::from_secs(3600))),
        clock,
        max_upload_bytes,
    );
    tokio::spawn(Server::new(state).serve(listener, std::future::pending()));
    addr
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, message: serde_json::Value) {
    ws.send(Message::Text(message.to_string().into()))
        .await
        .unwrap();
}

async fn next_message(ws: &mut Ws) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one matches.
async fn wait_for(ws: &mut Ws, matches: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
    loop {
        let message = next_message(ws).await;
        if matches(&message) {
            return message;
        }
    }
}

async fn create_room(ws: &mut Ws, room: &str, password: &str, user: &str, max_users: usize) {
    send(
        ws,
        json!({"type": "create-room", "payload": {
            "roomName": room, "password": password, "userName": user, "maxUsers": max_users
        }}),
    )
    .await;
    wait_for(ws, |m| matches!(m, ServerMessage::RoomCreated(_))).await;
}

async fn join_room(ws: &mut Ws, room: &str, password: &str, user: &str) -> ServerMessage {
    send(
        ws,
        json!({"type": "join-room", "payload": {
            "roomId": room, "password": password, "userName": user
        }}),
    )
    .await;
    wait_for(ws, |m| {
        matches!(
            m,
            ServerMessage::JoinedSuccessfully(_) | ServerMessage::ErrorMsg { .. }
        )
    })
    .await
}

/// Wait until the server has torn the room down.
async fn wait_until_gone(addr: SocketAddr, room: &str) {
    let url = format!("http://{}/api/rooms/{}", addr, room);
    for _ in 0..100 {
        let status = reqwest::get(&url).await.unwrap().status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room {} was never destroyed", room);
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let body: serde_json::Value = reqwest::get(format!("http://{}/api/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_capacity_is_enforced() {
    // テスト項目: 定員 2 のルームに 3 人目は参加できない
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    let mut carl = connect(addr).await;
    create_room(&mut alice, "ALPHA", "pw", "alice", 2).await;

    // when (操作):
    let bob_result = join_room(&mut bob, "ALPHA", "pw", "bob").await;
    let carl_result = join_room(&mut carl, "ALPHA", "pw", "carl").await;

    // then (期待する結果):
    let ServerMessage::JoinedSuccessfully(welcome) = bob_result else {
        panic!("bob should have joined, got {:?}", bob_result);
    };
    assert_eq!(welcome.users.len(), 2);
    assert!(welcome.users[0].is_host);
    assert_eq!(
        carl_result,
        ServerMessage::ErrorMsg {
            reason: "Room is full".to_string()
        }
    );
}

#[tokio::test]
async fn test_host_migrates_when_host_disconnects() {
    // テスト項目: ホストが切断すると残った参加者がホストになる
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    create_room(&mut alice, "ALPHA", "pw", "alice", 2).await;
    let ServerMessage::JoinedSuccessfully(welcome) = join_room(&mut bob, "ALPHA", "pw", "bob").await
    else {
        panic!("bob should have joined");
    };

    // when (操作):
    alice.close(None).await.unwrap();

    // then (期待する結果):
    wait_for(&mut bob, |m| *m == ServerMessage::YouAreHost).await;
    let detail: serde_json::Value = reqwest::get(format!("http://{}/api/rooms/ALPHA", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["users"][0]["id"], welcome.user_id);
    assert_eq!(detail["users"][0]["isHost"], true);
}

#[tokio::test]
async fn test_pad_survives_room_destruction() {
    // テスト項目: 保存したパッドは正しいパスワードで復号でき、誤ったパスワードではプレースホルダーになる
    // given (前提条件):
    let addr = start_server().await;
    let http = reqwest::Client::new();
    let mut alice = connect(addr).await;
    create_room(&mut alice, "PAD", "secret123", "alice", 4).await;
    let (payload, _next) = RatchetState::init("secret123", None)
        .unwrap()
        .encrypt("hello")
        .unwrap();
    assert_eq!(payload.step, 1);
    let saved = http
        .post(format!("http://{}/api/save-pad", addr))
        .json(&json!({"roomId": "PAD", "password": "secret123", "payload": payload}))
        .send()
        .await
        .unwrap();
    assert!(saved.status().is_success());
    alice.close(None).await.unwrap();
    wait_until_gone(addr, "PAD").await;

    // when (操作):
    let mut mallory = connect(addr).await;
    let wrong = join_room(&mut mallory, "PAD", "guess", "mallory").await;
    mallory.close(None).await.unwrap();
    wait_until_gone(addr, "PAD").await;
    let mut bob = connect(addr).await;
    let right = join_room(&mut bob, "PAD", "secret123", "bob").await;

    // then (期待する結果):
    let ServerMessage::JoinedSuccessfully(wrong) = wrong else {
        panic!("restoring join should succeed, got {:?}", wrong);
    };
    let stored: EncryptedPayload = serde_json::from_str(&wrong.content).unwrap();
    let shown = decrypt_or_placeholder("guess", &stored);
    assert_eq!(shown, UNREADABLE_PLACEHOLDER);
    assert_ne!(shown, "hello");

    let ServerMessage::JoinedSuccessfully(right) = right else {
        panic!("restoring join should succeed, got {:?}", right);
    };
    assert!(right.is_host);
    assert_eq!(right.pad_head, Some(PadHead::from(&payload)));
    let stored: EncryptedPayload = serde_json::from_str(&right.content).unwrap();
    assert_eq!(decrypt_or_placeholder("secret123", &stored), "hello");
}

#[tokio::test]
async fn test_pad_api_errors() {
    // テスト項目: パッド API の失敗が HTTP ステータスに対応付けられる
    // given (前提条件):
    let addr = start_server().await;
    let http = reqwest::Client::new();
    let mut alice = connect(addr).await;
    create_room(&mut alice, "PAD", "pw", "alice", 4).await;
    let (payload, _next) = RatchetState::init("pw", None).unwrap().encrypt("x").unwrap();
    let url = format!("http://{}/api/save-pad", addr);

    // when (操作):
    let wrong_password = http
        .post(&url)
        .json(&json!({"roomId": "PAD", "password": "nope", "payload": payload}))
        .send()
        .await
        .unwrap();
    let unknown_room = http
        .post(&url)
        .json(&json!({"roomId": "GHOST", "password": "pw", "payload": payload}))
        .send()
        .await
        .unwrap();
    let malformed = http
        .post(&url)
        .header("content-type", "application/json")
        .body("{\"roomId\": 1}")
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(wrong_password.status(), reqwest::StatusCode::FORBIDDEN);
    assert_eq!(unknown_room.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(malformed.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_pad_kicks_members() {
    // テスト項目: パッドの削除でメンバーに kicked が届き、ルームが消える
    // given (前提条件):
    let addr = start_server().await;
    let http = reqwest::Client::new();
    let mut alice = connect(addr).await;
    create_room(&mut alice, "PAD", "pw", "alice", 4).await;

    // when (操作):
    let response = http
        .delete(format!("http://{}/api/delete-pad", addr))
        .json(&json!({"roomId": "PAD", "password": "pw"}))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert!(response.status().is_success());
    wait_for(&mut alice, |m| *m == ServerMessage::Kicked).await;
    wait_until_gone(addr, "PAD").await;
}

#[tokio::test]
async fn test_edit_reaches_other_member() {
    // テスト項目: 本文の更新が他のメンバーに text-synced として届く
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    create_room(&mut alice, "ALPHA", "pw", "alice", 4).await;
    join_room(&mut bob, "ALPHA", "pw", "bob").await;

    // when (操作):
    send(
        &mut bob,
        json!({"type": "update-text", "payload": {"roomId": "ALPHA", "content": "draft"}}),
    )
    .await;

    // then (期待する結果):
    let synced = wait_for(&mut alice, |m| matches!(m, ServerMessage::TextSynced { .. })).await;
    assert_eq!(
        synced,
        ServerMessage::TextSynced {
            content: "draft".to_string()
        }
    );
}

#[tokio::test]
async fn test_oversized_upload_keeps_uploader_in_room() {
    // テスト項目: 上限を大きく超えるアップロードはエラーで応答され、接続とメンバー資格は維持される
    // given (前提条件):
    let addr = start_server_with_upload_limit(1024).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    create_room(&mut alice, "BIG", "pw", "alice", 4).await;
    join_room(&mut bob, "BIG", "pw", "bob").await;
    let content = "A".repeat(200_000);

    // when (操作):
    send(
        &mut alice,
        json!({"type": "upload-file", "payload": {"roomId": "BIG", "file": {
            "name": "huge.bin", "type": "application/octet-stream",
            "size": 150_000, "content": content
        }}}),
    )
    .await;
    let error = wait_for(&mut alice, |m| matches!(m, ServerMessage::ErrorMsg { .. })).await;
    send(
        &mut alice,
        json!({"type": "update-text", "payload": {"roomId": "BIG", "content": "still here"}}),
    )
    .await;

    // then (期待する結果):
    let ServerMessage::ErrorMsg { reason } = error else {
        unreachable!()
    };
    assert!(reason.contains("File is too large"), "{}", reason);
    assert!(reason.contains("limit is 1024 bytes"), "{}", reason);
    let synced = wait_for(&mut bob, |m| matches!(m, ServerMessage::TextSynced { .. })).await;
    assert_eq!(
        synced,
        ServerMessage::TextSynced {
            content: "still here".to_string()
        }
    );
    let detail: serde_json::Value = reqwest::get(format!("http://{}/api/rooms/BIG", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_save_must_continue_stored_chain() {
    // テスト項目: 保存済みの鎖を継がない保存は 409 になり、継いだ保存はメンバーに pad-saved で届く
    // given (前提条件):
    let addr = start_server().await;
    let http = reqwest::Client::new();
    let url = format!("http://{}/api/save-pad", addr);
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    create_room(&mut alice, "PAD", "pw", "alice", 4).await;
    join_room(&mut bob, "PAD", "pw", "bob").await;
    let (first, next) = RatchetState::init("pw", None).unwrap().encrypt("v1").unwrap();
    let saved = http
        .post(&url)
        .json(&json!({"roomId": "PAD", "password": "pw", "payload": first}))
        .send()
        .await
        .unwrap();
    assert!(saved.status().is_success());
    let head = wait_for(&mut bob, |m| matches!(m, ServerMessage::PadSaved(_))).await;
    assert_eq!(head, ServerMessage::PadSaved(PadHead::from(&first)));

    // when (操作):
    let (forked, _) = RatchetState::init("pw", None).unwrap().encrypt("other").unwrap();
    let fork = http
        .post(&url)
        .json(&json!({"roomId": "PAD", "password": "pw", "payload": forked}))
        .send()
        .await
        .unwrap();
    let replay = http
        .post(&url)
        .json(&json!({"roomId": "PAD", "password": "pw", "payload": first}))
        .send()
        .await
        .unwrap();
    let (second, _) = next.encrypt("v2").unwrap();
    let continued = http
        .post(&url)
        .json(&json!({"roomId": "PAD", "password": "pw", "payload": second}))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(fork.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(replay.status(), reqwest::StatusCode::CONFLICT);
    assert!(continued.status().is_success());
    let head = wait_for(&mut bob, |m| matches!(m, ServerMessage::PadSaved(_))).await;
    assert_eq!(
        head,
        ServerMessage::PadSaved(PadHead {
            salt: first.salt,
            step: 2
        })
    );
}
