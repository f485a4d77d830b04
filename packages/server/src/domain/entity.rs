//! エンティティ定義
//!
//! `RoomSession` はルームの唯一の正本です。参加者・本文・添付ファイル・権限・
//! ホストを保持し、メンバー操作はすべてこの型のメソッドを経由します。

use shadowpad_shared::cipher::PadHead;

use super::{
    error::RoomError,
    host_migration,
    value_object::{
        AttachmentId, Capability, ConnectionId, DisplayName, MaxUsers, RoomId, Timestamp,
    },
};

/// Room-wide capability defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub allow_edit: bool,
    pub allow_upload: bool,
    pub allow_delete: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            allow_edit: true,
            allow_upload: true,
            allow_delete: false,
        }
    }
}

impl Permissions {
    /// Every capability granted; what the host always sees.
    pub const ALL: Permissions = Permissions {
        allow_edit: true,
        allow_upload: true,
        allow_delete: true,
    };

    pub fn get(&self, cap: Capability) -> bool {
        match cap {
            Capability::Edit => self.allow_edit,
            Capability::Upload => self.allow_upload,
            Capability::Delete => self.allow_delete,
        }
    }

    pub fn set(&mut self, cap: Capability, value: bool) {
        match cap {
            Capability::Edit => self.allow_edit = value,
            Capability::Upload => self.allow_upload = value,
            Capability::Delete => self.allow_delete = value,
        }
    }
}

/// Per-participant overrides; `None` falls back to the room default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionOverrides {
    pub edit: Option<bool>,
    pub upload: Option<bool>,
    pub delete: Option<bool>,
}

impl PermissionOverrides {
    pub fn get(&self, cap: Capability) -> Option<bool> {
        match cap {
            Capability::Edit => self.edit,
            Capability::Upload => self.upload,
            Capability::Delete => self.delete,
        }
    }

    pub fn set(&mut self, cap: Capability, value: Option<bool>) {
        match cap {
            Capability::Edit => self.edit = value,
            Capability::Upload => self.upload = value,
            Capability::Delete => self.delete = value,
        }
    }
}

/// 参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub is_host: bool,
    pub overrides: PermissionOverrides,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(id: ConnectionId, name: DisplayName, joined_at: Timestamp) -> Self {
        Self {
            id,
            name,
            is_host: false,
            overrides: PermissionOverrides::default(),
            joined_at,
        }
    }
}

/// 添付ファイル
///
/// バイト列は常駐中のセッションにだけ存在し、永続化されません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub mime_type: String,
    pub size: usize,
    pub bytes: Vec<u8>,
    pub uploaded_at: Timestamp,
}

impl Attachment {
    pub fn new(name: String, mime_type: String, bytes: Vec<u8>, uploaded_at: Timestamp) -> Self {
        Self {
            id: AttachmentId::generate(),
            name,
            mime_type,
            size: bytes.len(),
            bytes,
            uploaded_at,
        }
    }
}

/// ルームセッション
///
/// ## 不変条件
///
/// - `users` が空でなければ、`is_host == true` の参加者はちょうど 1 人で、
///   `host_id` はその参加者を指す
/// - `users.len() <= max_users`
/// - `users` は参加順に並ぶ
#[derive(Debug)]
pub struct RoomSession {
    pub id: RoomId,
    pub display_name: String,
    pub content: String,
    secret: String,
    pub permissions: Permissions,
    pub host_id: Option<ConnectionId>,
    pub max_users: MaxUsers,
    pub users: Vec<Participant>,
    pub files: Vec<Attachment>,
    pub created_at: Timestamp,
    /// Salt and step of the newest stored snapshot, if the pad was ever saved.
    pub pad_head: Option<PadHead>,
    /// Set once the session is dropped from the registry; a task that was
    /// waiting on the lock must not mutate it afterwards.
    destroyed: bool,
}

impl RoomSession {
    pub fn new(
        id: RoomId,
        display_name: impl Into<String>,
        secret: impl Into<String>,
        max_users: MaxUsers,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            content: String::new(),
            secret: secret.into(),
            permissions: Permissions::default(),
            host_id: None,
            max_users,
            users: Vec::new(),
            files: Vec::new(),
            created_at,
            pad_head: None,
            destroyed: false,
        }
    }

    /// Session rebuilt from a stored pad. The stored content is carried over
    /// verbatim; the caller's credential becomes the room secret.
    pub fn restored(
        id: RoomId,
        content: String,
        head: PadHead,
        secret: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        let display_name = id.as_str().to_string();
        let mut session = Self::new(id, display_name, secret, MaxUsers::default(), created_at);
        session.content = content;
        session.pad_head = Some(head);
        session
    }

    /// Verbatim comparison against the join credential.
    pub fn verify_secret(&self, candidate: &str) -> bool {
        self.secret == candidate
    }

    pub fn is_full(&self) -> bool {
        self.users.len() >= self.max_users.value()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Append a participant. The participant becomes host when `as_host`
    /// is set or when the room has no host yet.
    pub fn admit(&mut self, participant: Participant, as_host: bool) -> Result<(), RoomError> {
        if self.is_member(&participant.id) {
            return Err(RoomError::InvalidInput(
                "already a member of this room".to_string(),
            ));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        let id = participant.id.clone();
        self.users.push(participant);
        if as_host || self.host_id.is_none() {
            host_migration::assign_host(self, &id);
        }
        Ok(())
    }

    /// Remove a participant, leaving host migration to the caller.
    pub fn remove_participant(&mut self, id: &ConnectionId) -> Option<Participant> {
        let index = self.users.iter().position(|u| &u.id == id)?;
        Some(self.users.remove(index))
    }

    pub fn participant(&self, id: &ConnectionId) -> Option<&Participant> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn participant_mut(&mut self, id: &ConnectionId) -> Option<&mut Participant> {
        self.users.iter_mut().find(|u| &u.id == id)
    }

    pub fn is_member(&self, id: &ConnectionId) -> bool {
        self.participant(id).is_some()
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.users.iter().map(|u| u.id.clone()).collect()
    }

    /// Whole-document replace; the last writer wins.
    pub fn replace_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.files.push(attachment);
    }

    pub fn remove_attachment(&mut self, id: &AttachmentId) -> Option<Attachment> {
        let index = self.files.iter().position(|f| &f.id == id)?;
        Some(self.files.remove(index))
    }

    pub fn find_attachment(&self, id: &AttachmentId) -> Option<&Attachment> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Drop every member and attachment and flag the session as gone.
    pub fn mark_destroyed(&mut self) -> Vec<ConnectionId> {
        let members = self.member_ids();
        self.users.clear();
        self.files.clear();
        self.host_id = None;
        self.destroyed = true;
        members
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Read-only copy for queries; excludes the secret, content and file bytes.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            max_users: self.max_users,
            created_at: self.created_at,
            users: self.users.clone(),
            file_count: self.files.len(),
        }
    }
}

/// ルームの参照用スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub display_name: String,
    pub max_users: MaxUsers,
    pub created_at: Timestamp,
    pub users: Vec<Participant>,
    pub file_count: usize,
}
