//! Client-side state and the pure logic that updates it.
//!
//! Server messages are folded into [`ClientState`] here without any I/O so
//! the session loop only has to print and send.

use std::path::Path;

use shadowpad_server::infrastructure::dto::websocket::{
    FileMetaDto, PermissionsDto, RoomWelcomeDto, ServerMessage, UserDto,
};

use crate::{
    error::ClientError,
    pad::{PadSession, Revealed},
};

/// Room id and password of the room the client is in, kept for `/save`,
/// `/delete-pad`, and rejoining after a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub room_id: String,
    pub password: String,
}

/// Local mirror of the joined room.
#[derive(Debug)]
pub struct RoomView {
    pub room_id: String,
    pub room_name: String,
    pub user_id: String,
    pub is_host: bool,
    pub max_users: usize,
    /// Text as shown to the user (decrypted when the room held a stored pad).
    pub content: String,
    pub users: Vec<UserDto>,
    pub files: Vec<FileMetaDto>,
    pub permissions: PermissionsDto,
    pub room_permissions: PermissionsDto,
    pub pad: PadSession,
}

#[derive(Debug, Default)]
pub struct ClientState {
    pub room: Option<RoomView>,
    pub credentials: Option<Credentials>,
    /// Password sent with a create or join that has not been answered yet.
    pending_password: Option<String>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the password of an outgoing create or join.
    pub fn expect_welcome(&mut self, password: &str) {
        self.pending_password = Some(password.to_string());
    }

    /// Forget the current room after leaving it.
    pub fn leave(&mut self) {
        self.room = None;
        self.credentials = None;
        self.pending_password = None;
    }

    /// Prepare to rejoin the last room on a fresh connection.
    ///
    /// The old membership is gone with the old socket, so the room view is
    /// dropped and the stored password awaits the next welcome.
    pub fn take_rejoin(&mut self) -> Option<Credentials> {
        self.room = None;
        let credentials = self.credentials.clone()?;
        self.pending_password = Some(credentials.password.clone());
        Some(credentials)
    }

    pub fn room(&self) -> Result<&RoomView, ClientError> {
        self.room.as_ref().ok_or(ClientError::NotInRoom)
    }

    pub fn room_mut(&mut self) -> Result<&mut RoomView, ClientError> {
        self.room.as_mut().ok_or(ClientError::NotInRoom)
    }

    /// Fold one server message into the state.
    ///
    /// Returns the revealed room text for welcome and sync messages so the
    /// caller can show it.
    pub fn apply(&mut self, message: &ServerMessage) -> Option<Revealed> {
        match message {
            ServerMessage::RoomCreated(welcome) | ServerMessage::JoinedSuccessfully(welcome) => {
                Some(self.enter(welcome))
            }
            ServerMessage::ErrorMsg { .. } => {
                self.pending_password = None;
                None
            }
            ServerMessage::YouAreHost => {
                if let Some(room) = self.room.as_mut() {
                    room.is_host = true;
                }
                None
            }
            ServerMessage::UpdateUserList { users } => {
                if let Some(room) = self.room.as_mut() {
                    if let Some(me) = users.iter().find(|u| u.id == room.user_id) {
                        room.is_host = me.is_host;
                        room.permissions = me.permissions;
                    }
                    room.users = users.clone();
                }
                None
            }
            ServerMessage::UpdateFileList { files } => {
                if let Some(room) = self.room.as_mut() {
                    room.files = files.clone();
                }
                None
            }
            ServerMessage::TextSynced { content } => {
                let room = self.room.as_mut()?;
                let revealed = room.pad.reveal(content);
                room.content = revealed.text().to_string();
                Some(revealed)
            }
            ServerMessage::UpdatePermissions(permissions) => {
                if let Some(room) = self.room.as_mut() {
                    room.room_permissions = *permissions;
                }
                None
            }
            ServerMessage::Kicked => {
                self.leave();
                None
            }
            ServerMessage::PadSaved(head) => {
                if let Some(room) = self.room.as_mut() {
                    room.pad.follow(*head);
                }
                None
            }
            ServerMessage::ActivityLog { .. }
            | ServerMessage::UserTyping { .. }
            | ServerMessage::FileContent(_) => None,
        }
    }

    fn enter(&mut self, welcome: &RoomWelcomeDto) -> Revealed {
        let password = self
            .pending_password
            .take()
            .or_else(|| self.credentials.as_ref().map(|c| c.password.clone()))
            .unwrap_or_default();
        let (revealed, pad) = PadSession::open(&password, &welcome.content, welcome.pad_head);

        self.credentials = Some(Credentials {
            room_id: welcome.room_id.clone(),
            password,
        });
        self.room = Some(RoomView {
            room_id: welcome.room_id.clone(),
            room_name: welcome.room_name.clone(),
            user_id: welcome.user_id.clone(),
            is_host: welcome.is_host,
            max_users: welcome.max_users,
            content: revealed.text().to_string(),
            users: welcome.users.clone(),
            files: welcome.files.clone(),
            permissions: welcome.permissions,
            room_permissions: welcome.room_permissions,
            pad,
        });
        revealed
    }
}

/// Derive the HTTP origin from the WebSocket URL.
///
/// `ws://host:port/ws` becomes `http://host:port`; `wss` maps to `https`.
pub fn api_url_from_ws(ws_url: &str) -> String {
    let (scheme, rest) = match ws_url.split_once("://") {
        Some(("wss", rest)) => ("https", rest),
        Some((_, rest)) => ("http", rest),
        None => ("http", ws_url),
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    format!("{}://{}", scheme, authority)
}

/// Keep only the final path component of an attachment name and drop
/// characters that are unsafe in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Best-effort MIME type from a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("html" | "htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Check if the client should exit immediately based on the error type.
///
/// A refused upgrade usually means a wrong URL, which retrying cannot fix.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::HandshakeRejected(_))
}

/// Check if the client should attempt to reconnect.
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
