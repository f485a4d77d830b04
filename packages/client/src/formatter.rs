//! Message formatting utilities for client display.

use shadowpad_server::infrastructure::dto::websocket::{FileMetaDto, PermissionsDto, UserDto};
use shadowpad_shared::time::timestamp_to_rfc3339;

use crate::domain::RoomView;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner shown after creating or joining a room
    ///
    /// # Arguments
    ///
    /// * `room` - The room that was entered
    /// * `created` - Whether this client created the room
    ///
    /// # Returns
    ///
    /// A formatted string with the room summary, participants and document
    pub fn format_welcome(room: &RoomView, created: bool) -> String {
        let verb = if created { "Created" } else { "Joined" };
        let role = if room.is_host { "host" } else { "guest" };
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!(
            "{} room {} ({}) as {}, capacity {}\n",
            verb, room.room_id, room.room_name, role, room.max_users
        ));
        output.push_str(&format!(
            "Your permissions: {}\n",
            Self::permission_flags(&room.permissions)
        ));
        output.push_str(&Self::format_user_list(&room.users, &room.user_id));
        output.push_str(&Self::format_file_list(&room.files));
        output.push_str(&Self::format_document(&room.content));
        output
    }

    /// Format the participant list, marking the current user and the host
    pub fn format_user_list(users: &[UserDto], current_user_id: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nParticipants:\n", RULE));

        if users.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for user in users {
                let host_mark = if user.is_host { " [host]" } else { "" };
                let me_suffix = if user.id == current_user_id { " (me)" } else { "" };
                output.push_str(&format!(
                    "{}{}{} - {} - {}\n",
                    user.name,
                    host_mark,
                    me_suffix,
                    user.id,
                    Self::permission_flags(&user.permissions)
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the attachment list
    pub fn format_file_list(files: &[FileMetaDto]) -> String {
        let mut output = String::from("Files:\n");
        if files.is_empty() {
            output.push_str("(No files)\n");
        } else {
            for file in files {
                output.push_str(&format!(
                    "{} - {} ({}, {} bytes)\n",
                    file.id, file.name, file.mime_type, file.size
                ));
            }
        }
        output
    }

    /// Format the whole document between rules
    pub fn format_document(content: &str) -> String {
        let body = if content.is_empty() {
            "(empty)"
        } else {
            content
        };
        format!("\n{}\n{}\n{}\n", THIN_RULE, body, THIN_RULE)
    }

    /// Format an activity-log entry
    ///
    /// # Arguments
    ///
    /// * `message` - The activity description
    /// * `timestamp` - Unix timestamp of the activity (milliseconds)
    pub fn format_activity(message: &str, timestamp: i64) -> String {
        format!("\n* {} ({})\n", message, timestamp_to_rfc3339(timestamp))
    }

    /// Format a document update made by someone else
    pub fn format_text_synced(content: &str) -> String {
        format!("\n~ Document updated{}", Self::format_document(content))
    }

    /// Format a change to the room-wide default permissions
    pub fn format_room_permissions(permissions: &PermissionsDto) -> String {
        format!(
            "\n! Room permissions are now {}\n",
            Self::permission_flags(permissions)
        )
    }

    /// Format a typing indicator
    pub fn format_typing(user_name: &str) -> String {
        format!("\n… {} is typing\n", user_name)
    }

    /// Format an error reported by the server or raised locally
    pub fn format_error(reason: &str) -> String {
        format!("\n✗ {}\n", reason)
    }

    /// Format a local confirmation
    pub fn format_notice(text: &str) -> String {
        format!("\n✓ {}\n", text)
    }

    pub fn format_you_are_host() -> String {
        "\n★ You are now the host\n".to_string()
    }

    pub fn format_kicked() -> String {
        "\n✗ You were removed from the room\n".to_string()
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn permission_flags(permissions: &PermissionsDto) -> String {
        let flag = |allowed: bool, name: &str| {
            if allowed {
                name.to_string()
            } else {
                format!("no-{}", name)
            }
        };
        format!(
            "{} {} {}",
            flag(permissions.allow_edit, "edit"),
            flag(permissions.allow_upload, "upload"),
            flag(permissions.allow_delete, "delete")
        )
    }
}
