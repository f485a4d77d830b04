//! Parsing of the lines typed at the prompt.
//!
//! Lines starting with `/` are commands; anything else is appended to the
//! document as a new line.

use std::path::PathBuf;

use shadowpad_server::domain::Capability;

use crate::error::ClientError;

pub const HELP: &str = "\
Commands:
  /create <room> <password> [max-users]   create a room and become its host
  /join <room> <password>                 join (or reopen a saved pad)
  /leave                                  leave the current room
  <text>                                  append a line to the document
  /set <text>                             replace the whole document
  /clear                                  empty the document
  /show                                   print the document
  /users                                  list participants
  /files                                  list attachments
  /upload <path>                          attach a file
  /download <file-id>                     save an attachment to the current directory
  /rm <file-id>                           delete an attachment
  /perm <edit|upload|delete> <on|off>              room-wide default (host)
  /perm <edit|upload|delete> <on|off|clear> <user> per-user override (host)
  /promote <user-id>                      hand the host role over
  /kick <user-id>                         remove a participant
  /save                                   encrypt and store the pad
  /delete-pad                             delete the stored pad and close the room
  /help                                   show this help
  /quit                                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        room: String,
        password: String,
        max_users: Option<usize>,
    },
    Join {
        room: String,
        password: String,
    },
    Leave,
    Append(String),
    Replace(String),
    Clear,
    Show,
    Users,
    Files,
    Upload(PathBuf),
    Download(String),
    DeleteFile(String),
    RoomPermission {
        capability: Capability,
        allow: bool,
    },
    UserPermission {
        capability: Capability,
        value: Option<bool>,
        user_id: String,
    },
    Promote(String),
    Kick(String),
    Save,
    DeletePad,
    Help,
    Quit,
}

/// Parse one non-empty input line.
pub fn parse(line: &str) -> Result<Command, ClientError> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Append(line.to_string()));
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let words: Vec<&str> = args.split_whitespace().collect();

    let command = match (name, words.as_slice()) {
        ("create", [room, password]) => Command::Create {
            room: room.to_string(),
            password: password.to_string(),
            max_users: None,
        },
        ("create", [room, password, max]) => Command::Create {
            room: room.to_string(),
            password: password.to_string(),
            max_users: Some(
                max.parse()
                    .map_err(|_| invalid(format!("'{}' is not a number", max)))?,
            ),
        },
        ("join", [room, password]) => Command::Join {
            room: room.to_string(),
            password: password.to_string(),
        },
        ("leave", []) => Command::Leave,
        ("set", _) => Command::Replace(args.to_string()),
        ("clear", []) => Command::Clear,
        ("show", []) => Command::Show,
        ("users", []) => Command::Users,
        ("files", []) => Command::Files,
        ("upload", _) if !args.is_empty() => Command::Upload(PathBuf::from(args)),
        ("download", [id]) => Command::Download(id.to_string()),
        ("rm", [id]) => Command::DeleteFile(id.to_string()),
        ("perm", [cap, toggle]) => Command::RoomPermission {
            capability: capability(cap)?,
            allow: toggle_value(toggle)?
                .ok_or_else(|| invalid("room defaults cannot be cleared"))?,
        },
        ("perm", [cap, toggle, user]) => Command::UserPermission {
            capability: capability(cap)?,
            value: toggle_value(toggle)?,
            user_id: user.to_string(),
        },
        ("promote", [user]) => Command::Promote(user.to_string()),
        ("kick", [user]) => Command::Kick(user.to_string()),
        ("save", []) => Command::Save,
        ("delete-pad", []) => Command::DeletePad,
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        _ => return Err(invalid(format!("Unknown or malformed command '/{}' (try /help)", name))),
    };
    Ok(command)
}

fn capability(word: &str) -> Result<Capability, ClientError> {
    Capability::ALL
        .into_iter()
        .find(|c| c.as_str() == word)
        .ok_or_else(|| invalid(format!("unknown permission '{}'", word)))
}

fn toggle_value(word: &str) -> Result<Option<bool>, ClientError> {
    match word {
        "on" => Ok(Some(true)),
        "off" => Ok(Some(false)),
        "clear" => Ok(None),
        _ => Err(invalid(format!("expected on, off or clear, got '{}'", word))),
    }
}

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::InvalidCommand(message.into())
}
