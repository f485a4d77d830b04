//! WebSocket client session management.

use std::{path::Path, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use shadowpad_server::{
    domain::Capability,
    infrastructure::dto::websocket::{
        ClientMessage, FileContentDto, ServerMessage, UploadedFileDto,
    },
    usecase::DEFAULT_MAX_UPLOAD_BYTES,
};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::{
    command::{self, Command, HELP},
    domain::{ClientState, guess_mime_type, sanitize_file_name},
    error::ClientError,
    formatter::MessageFormatter,
    pad::Revealed,
    pad_api::PadApi,
    ui::print_above_prompt,
};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

enum Flow {
    Continue,
    Quit,
}

/// Run one WebSocket connection until the user quits or the connection drops.
///
/// Lines come from `input_rx`, which outlives the session so a reconnect
/// keeps the same terminal reader.
pub async fn run_client_session(
    url: &str,
    user_name: &str,
    api: &PadApi,
    state: &Arc<Mutex<ClientState>>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = match connect_async(url).await {
        Ok(result) => result,
        // The server answered, but not with an upgrade
        Err(WsError::Http(response)) => {
            return Err(ClientError::HandshakeRejected(response.status().as_u16()));
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    tracing::info!("Connected to ShadowPad server!");
    let (mut write, mut read) = ws_stream.split();

    let rejoin = state.lock().await.take_rejoin();
    match rejoin {
        Some(credentials) => {
            println!("\nRejoining room {} ...\n", credentials.room_id);
            send(
                &mut write,
                &ClientMessage::JoinRoom {
                    room_id: credentials.room_id,
                    password: credentials.password,
                    user_name: user_name.to_string(),
                },
            )
            .await?;
        }
        None => {
            println!(
                "\nYou are '{}'. Use /create or /join to enter a room, /help for all commands.\n",
                user_name
            );
        }
    }

    // Spawn a task to handle incoming messages
    let state_for_read = state.clone();
    let user_name_for_read = user_name.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    handle_server_text(&state_for_read, &user_name_for_read, text.as_str()).await;
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // Terminal closed
                    read_task.abort();
                    write.close().await.ok();
                    return Ok(());
                };
                match handle_line(&line, user_name, api, state, &mut write).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        read_task.abort();
                        write.close().await.ok();
                        return Ok(());
                    }
                    Err(e @ ClientError::ConnectionError(_)) => {
                        read_task.abort();
                        return Err(e);
                    }
                    Err(e) => {
                        print_above_prompt(&MessageFormatter::format_error(&e.to_string()), user_name);
                    }
                }
            }
        }
    }
}

async fn send(write: &mut WsSink, message: &ClientMessage) -> Result<(), ClientError> {
    let json = serde_json::to_string(message)?;
    tracing::debug!("Sending {}", message.kind());
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}

async fn handle_server_text(state: &Mutex<ClientState>, user_name: &str, text: &str) {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(_) => {
            print_above_prompt(&MessageFormatter::format_raw_message(text), user_name);
            return;
        }
    };

    let output = match &message {
        ServerMessage::FileContent(file) => Some(save_download(file).await),
        _ => {
            let mut state = state.lock().await;
            let revealed = state.apply(&message);
            render(&state, &message, revealed.as_ref())
        }
    };

    if let Some(output) = output {
        print_above_prompt(&output, user_name);
    }
}

fn render(state: &ClientState, message: &ServerMessage, revealed: Option<&Revealed>) -> Option<String> {
    let output = match message {
        ServerMessage::RoomCreated(_) | ServerMessage::JoinedSuccessfully(_) => {
            let room = state.room.as_ref()?;
            let created = matches!(message, ServerMessage::RoomCreated(_));
            let mut output = MessageFormatter::format_welcome(room, created);
            if revealed == Some(&Revealed::Unreadable) {
                output.push_str(&MessageFormatter::format_error(
                    "This pad could not be decrypted with that password. Editing and /save are disabled.",
                ));
            }
            output
        }
        ServerMessage::ErrorMsg { reason } => MessageFormatter::format_error(reason),
        ServerMessage::YouAreHost => MessageFormatter::format_you_are_host(),
        ServerMessage::UpdateUserList { users } => {
            let me = state.room.as_ref().map(|r| r.user_id.as_str()).unwrap_or_default();
            MessageFormatter::format_user_list(users, me)
        }
        ServerMessage::UpdateFileList { files } => MessageFormatter::format_file_list(files),
        ServerMessage::TextSynced { .. } => {
            MessageFormatter::format_text_synced(revealed?.text())
        }
        ServerMessage::UpdatePermissions(permissions) => {
            MessageFormatter::format_room_permissions(permissions)
        }
        ServerMessage::ActivityLog { message, timestamp } => {
            MessageFormatter::format_activity(message, *timestamp)
        }
        ServerMessage::Kicked => MessageFormatter::format_kicked(),
        ServerMessage::UserTyping { user_name, .. } => MessageFormatter::format_typing(user_name),
        ServerMessage::FileContent(_) | ServerMessage::PadSaved(_) => return None,
    };
    Some(output)
}

/// Write a downloaded attachment into the current directory.
async fn save_download(file: &FileContentDto) -> String {
    let bytes = match BASE64.decode(&file.content) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Attachment {} is not valid base64: {}", file.id, e);
            return MessageFormatter::format_error(&format!("Could not decode {}", file.name));
        }
    };
    let file_name = sanitize_file_name(&file.name);
    match tokio::fs::write(&file_name, &bytes).await {
        Ok(()) => MessageFormatter::format_notice(&format!(
            "Saved {} ({} bytes)",
            file_name,
            bytes.len()
        )),
        Err(e) => MessageFormatter::format_error(&format!("Could not write {}: {}", file_name, e)),
    }
}

async fn handle_line(
    line: &str,
    user_name: &str,
    api: &PadApi,
    state: &Mutex<ClientState>,
    write: &mut WsSink,
) -> Result<Flow, ClientError> {
    match command::parse(line)? {
        Command::Create {
            room,
            password,
            max_users,
        } => {
            state.lock().await.expect_welcome(&password);
            send(
                write,
                &ClientMessage::CreateRoom {
                    room_name: room,
                    password,
                    user_name: user_name.to_string(),
                    max_users,
                },
            )
            .await?;
        }
        Command::Join { room, password } => {
            state.lock().await.expect_welcome(&password);
            send(
                write,
                &ClientMessage::JoinRoom {
                    room_id: room,
                    password,
                    user_name: user_name.to_string(),
                },
            )
            .await?;
        }
        Command::Leave => {
            let room_id = {
                let mut state = state.lock().await;
                let room_id = state.room()?.room_id.clone();
                state.leave();
                room_id
            };
            send(write, &ClientMessage::LeaveRoom { room_id: room_id.clone() }).await?;
            print_above_prompt(
                &MessageFormatter::format_notice(&format!("Left room {}", room_id)),
                user_name,
            );
        }
        Command::Append(text) => {
            edit(state, write, |content| {
                if content.is_empty() {
                    text
                } else {
                    format!("{}\n{}", content, text)
                }
            })
            .await?;
        }
        Command::Replace(text) => edit(state, write, |_| text).await?,
        Command::Clear => edit(state, write, |_| String::new()).await?,
        Command::Show => {
            let output = MessageFormatter::format_document(&state.lock().await.room()?.content);
            print_above_prompt(&output, user_name);
        }
        Command::Users => {
            let output = {
                let state = state.lock().await;
                let room = state.room()?;
                MessageFormatter::format_user_list(&room.users, &room.user_id)
            };
            print_above_prompt(&output, user_name);
        }
        Command::Files => {
            let output = MessageFormatter::format_file_list(&state.lock().await.room()?.files);
            print_above_prompt(&output, user_name);
        }
        Command::Upload(path) => upload(&path, state, write).await?,
        Command::Download(file_id) => {
            let room_id = current_room_id(state).await?;
            send(write, &ClientMessage::DownloadFile { room_id, file_id }).await?;
        }
        Command::DeleteFile(file_id) => {
            let room_id = current_room_id(state).await?;
            send(write, &ClientMessage::DeleteFile { room_id, file_id }).await?;
        }
        Command::RoomPermission { capability, allow } => {
            let room_id = current_room_id(state).await?;
            let only = |cap: Capability| (cap == capability).then_some(allow);
            send(
                write,
                &ClientMessage::UpdatePermissions {
                    room_id,
                    allow_edit: only(Capability::Edit),
                    allow_upload: only(Capability::Upload),
                    allow_delete: only(Capability::Delete),
                },
            )
            .await?;
        }
        Command::UserPermission {
            capability,
            value,
            user_id,
        } => {
            let room_id = current_room_id(state).await?;
            send(
                write,
                &ClientMessage::ToggleUserPermission {
                    room_id,
                    user_id,
                    permission: capability,
                    value,
                },
            )
            .await?;
        }
        Command::Promote(user_id) => {
            let room_id = current_room_id(state).await?;
            send(write, &ClientMessage::PromoteHost { room_id, user_id }).await?;
        }
        Command::Kick(user_id) => {
            let room_id = current_room_id(state).await?;
            send(write, &ClientMessage::HostKickUser { room_id, user_id }).await?;
        }
        Command::Save => {
            let (room_id, password, payload) = {
                let mut state = state.lock().await;
                let credentials = state.credentials.clone().ok_or(ClientError::NotInRoom)?;
                let room = state.room_mut()?;
                let content = room.content.clone();
                let payload = room.pad.seal(&content)?;
                (credentials.room_id, credentials.password, payload)
            };
            let step = payload.step;
            api.save(&room_id, &password, payload).await?;
            print_above_prompt(
                &MessageFormatter::format_notice(&format!("Pad saved (snapshot {})", step)),
                user_name,
            );
        }
        Command::DeletePad => {
            let credentials = {
                let state = state.lock().await;
                state.room()?;
                state.credentials.clone().ok_or(ClientError::NotInRoom)?
            };
            api.delete(&credentials.room_id, &credentials.password).await?;
            print_above_prompt(&MessageFormatter::format_notice("Pad deleted"), user_name);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn current_room_id(state: &Mutex<ClientState>) -> Result<String, ClientError> {
    Ok(state.lock().await.room()?.room_id.clone())
}

/// Apply a local edit and send the whole new text.
async fn edit(
    state: &Mutex<ClientState>,
    write: &mut WsSink,
    change: impl FnOnce(&str) -> String,
) -> Result<(), ClientError> {
    let (room_id, content) = {
        let mut state = state.lock().await;
        let room = state.room_mut()?;
        if !room.permissions.allow_edit {
            return Err(ClientError::InvalidCommand(
                "You do not have permission to edit".to_string(),
            ));
        }
        if !room.pad.is_readable() {
            return Err(ClientError::UnreadablePad);
        }
        room.content = change(&room.content);
        (room.room_id.clone(), room.content.clone())
    };
    send(
        write,
        &ClientMessage::Typing {
            room_id: room_id.clone(),
        },
    )
    .await?;
    send(write, &ClientMessage::UpdateText { room_id, content }).await
}

async fn upload(
    path: &Path,
    state: &Mutex<ClientState>,
    write: &mut WsSink,
) -> Result<(), ClientError> {
    let room_id = current_room_id(state).await?;
    let bytes = tokio::fs::read(path).await?;
    if bytes.len() > DEFAULT_MAX_UPLOAD_BYTES {
        return Err(ClientError::InvalidCommand(format!(
            "{} is larger than the {} MiB upload limit",
            path.display(),
            DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let file = UploadedFileDto {
        name,
        mime_type: guess_mime_type(path).to_string(),
        size: bytes.len(),
        content: BASE64.encode(&bytes),
    };
    send(write, &ClientMessage::UploadFile { room_id, file }).await
}
