//! Client side of pad encryption.
//!
//! The server only relays text; a stored pad reaches the client as the JSON
//! of an [`EncryptedPayload`] and is opened here with the room password. Saving
//! continues the ratchet from the newest stored snapshot (announced in the
//! welcome and in every `pad-saved`) so every stored snapshot is one step
//! further along the same chain.

use shadowpad_shared::cipher::{
    EncryptedPayload, PadHead, RatchetState, SALT_SIZE, UNREADABLE_PLACEHOLDER, decrypt,
};

use crate::error::ClientError;

/// What the room content turned out to be when it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revealed {
    /// Ordinary live text.
    Plain(String),
    /// A stored snapshot that decrypted with the password.
    Decrypted(String),
    /// A stored snapshot that did not decrypt; the placeholder is shown.
    Unreadable,
}

impl Revealed {
    /// Text to put in front of the user.
    pub fn text(&self) -> &str {
        match self {
            Revealed::Plain(text) | Revealed::Decrypted(text) => text,
            Revealed::Unreadable => UNREADABLE_PLACEHOLDER,
        }
    }
}

enum Chain {
    Fresh,
    Resume { salt: [u8; SALT_SIZE], step: u64 },
    Live(RatchetState),
}

/// Encryption state for one room membership.
pub struct PadSession {
    password: String,
    chain: Chain,
    readable: bool,
}

impl std::fmt::Debug for PadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadSession")
            .field("readable", &self.readable)
            .finish_non_exhaustive()
    }
}

impl PadSession {
    /// Open room content received on join.
    ///
    /// `head` is the newest stored snapshot; it is where the chain continues
    /// when the live content is already plain text.
    pub fn open(password: &str, content: &str, head: Option<PadHead>) -> (Revealed, PadSession) {
        let (revealed, chain) = match serde_json::from_str::<EncryptedPayload>(content) {
            Ok(payload) => {
                let chain = Chain::Resume {
                    salt: payload.salt,
                    step: payload.step,
                };
                match decrypt(password, &payload) {
                    Ok(text) => (Revealed::Decrypted(text), chain),
                    Err(e) => {
                        tracing::warn!("Stored pad did not decrypt: {}", e);
                        (Revealed::Unreadable, chain)
                    }
                }
            }
            Err(_) => {
                let chain = match head {
                    Some(head) => Chain::Resume {
                        salt: head.salt,
                        step: head.step,
                    },
                    None => Chain::Fresh,
                };
                (Revealed::Plain(content.to_string()), chain)
            }
        };
        let readable = revealed != Revealed::Unreadable;
        let session = PadSession {
            password: password.to_string(),
            chain,
            readable,
        };
        (revealed, session)
    }

    /// Whether the opened snapshot was readable with this password.
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Move to a snapshot stored by anyone in the room.
    ///
    /// A live chain that already sits at `head` is kept as is.
    pub fn follow(&mut self, head: PadHead) {
        if let Chain::Live(state) = &self.chain
            && *state.salt() == head.salt
            && state.step() == head.step
        {
            return;
        }
        self.chain = Chain::Resume {
            salt: head.salt,
            step: head.step,
        };
    }

    /// Reveal content that arrived later in the session.
    pub fn reveal(&self, content: &str) -> Revealed {
        match serde_json::from_str::<EncryptedPayload>(content) {
            Ok(payload) => match decrypt(&self.password, &payload) {
                Ok(text) => Revealed::Decrypted(text),
                Err(_) => Revealed::Unreadable,
            },
            Err(_) => Revealed::Plain(content.to_string()),
        }
    }

    /// Encrypt the current text as the next snapshot of the chain.
    ///
    /// Refused when the opened snapshot was unreadable, so a wrong password
    /// can never overwrite a pad it could not read.
    pub fn seal(&mut self, plaintext: &str) -> Result<EncryptedPayload, ClientError> {
        if !self.readable {
            return Err(ClientError::UnreadablePad);
        }

        let state = match std::mem::replace(&mut self.chain, Chain::Fresh) {
            Chain::Live(state) => state,
            Chain::Resume { salt, step } => match RatchetState::resume(&self.password, salt, step) {
                Ok(state) => state,
                Err(e) => {
                    self.chain = Chain::Resume { salt, step };
                    return Err(e.into());
                }
            },
            Chain::Fresh => RatchetState::init(&self.password, None)?,
        };
        let resume_point = (*state.salt(), state.step());

        match state.encrypt(plaintext) {
            Ok((payload, next)) => {
                self.chain = Chain::Live(next);
                Ok(payload)
            }
            Err(e) => {
                self.chain = Chain::Resume {
                    salt: resume_point.0,
                    step: resume_point.1,
                };
                Err(e.into())
            }
        }
    }
}
