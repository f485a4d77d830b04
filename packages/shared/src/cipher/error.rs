//! Error types for pad encryption.

use thiserror::Error;

/// Errors produced by the ratchet cipher.
///
/// Messages stay generic so a failed decryption reveals nothing about
/// whether the password or the data was wrong.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Password-based or HKDF key derivation failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,

    /// Authenticated encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Wrong password, corrupted data, or an unreachable ratchet step.
    #[error("decryption failed")]
    DecryptionFailed,
}
