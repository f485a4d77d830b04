//! Forward-secure pad encryption.
//!
//! Pad content is encrypted on the client before it is handed to the server
//! for durable storage, so the persistence layer only ever holds ciphertext.
//!
//! - **PBKDF2-HMAC-SHA256** (100,000 rounds): password + salt → step-0 chain key
//! - **HKDF-SHA256**: chain key → (message key, next chain key)
//! - **AES-256-GCM**: authenticated encryption with a random 96-bit nonce
//!
//! ## Key schedule
//!
//! ```text
//! password, salt ──PBKDF2──▶ CK0 ──HKDF──▶ CK1 ──HKDF──▶ CK2 ...
//!                                   │            │
//!                                   ▼            ▼
//!                                  MK1          MK2
//! ```
//!
//! Each encryption consumes the current state and returns the next one, so a
//! chain key can never be reused once the following key has been derived.
//! The server stores only the newest payload (salt + step + iv + ciphertext);
//! readers rebuild the chain from the password and walk it forward to `step`.

mod error;
mod payload;
mod ratchet;

pub use error::CipherError;
pub use payload::{EncryptedPayload, PadHead};
pub use ratchet::{
    MAX_STEP, MessageKey, PBKDF2_ITERATIONS, RatchetState, UNREADABLE_PLACEHOLDER, decrypt,
    decrypt_or_placeholder,
};

/// Size of the PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of chain and message keys in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;
