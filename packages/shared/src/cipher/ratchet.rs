//! Password-derived symmetric ratchet.
//!
//! The ratchet is a one-way chain: every `turn` splits the current chain key
//! into a one-time message key and the next chain key, then drops the old one.
//! Holding a message key (or a later chain key) does not reveal earlier keys.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use hkdf::Hkdf;
use hmac::Hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{CipherError, EncryptedPayload, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// PBKDF2 rounds used to stretch the pad password into the step-0 chain key.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Highest step `decrypt` will walk the chain to.
pub const MAX_STEP: u64 = 1 << 20;

/// Rendered in place of pad content that cannot be decrypted.
///
/// Never empty: an empty editor would look like genuinely empty content and
/// be saved over the real ciphertext.
pub const UNREADABLE_PLACEHOLDER: &str = "--- 🔒 ENCRYPTED DATA (WRONG PASSWORD?) ---";

/// HKDF info strings - domain separation between the two chain outputs
const CHAIN_KEY_INFO: &[u8] = b"ShadowPad Ratchet Chain Key v1";
const MESSAGE_KEY_INFO: &[u8] = b"ShadowPad Ratchet Message Key v1";

/// One-time key that encrypts exactly one snapshot. Zeroized on drop.
pub struct MessageKey(Zeroizing<[u8; KEY_SIZE]>);

impl MessageKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MessageKey(<redacted>)")
    }
}

/// Client-local ratchet position.
///
/// Methods that advance the chain take `self` by value, so the previous state
/// (and its chain key) is consumed and zeroized when the next one is produced.
pub struct RatchetState {
    salt: [u8; SALT_SIZE],
    chain_key: Zeroizing<[u8; KEY_SIZE]>,
    step: u64,
}

impl fmt::Debug for RatchetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RatchetState")
            .field("step", &self.step)
            .field("chain_key", &"<redacted>")
            .finish()
    }
}

impl RatchetState {
    /// Derive the step-0 state from a password.
    ///
    /// Pass `None` for a brand-new pad (a random salt is generated) or the
    /// stored salt when reopening one; the same password over the same salt
    /// always reproduces the same chain.
    pub fn init(password: &str, salt: Option<[u8; SALT_SIZE]>) -> Result<Self, CipherError> {
        let salt = salt.unwrap_or_else(|| {
            let mut fresh = [0u8; SALT_SIZE];
            OsRng.fill_bytes(&mut fresh);
            fresh
        });

        let mut chain_key = Zeroizing::new([0u8; KEY_SIZE]);
        pbkdf2::pbkdf2::<Hmac<Sha256>>(
            password.as_bytes(),
            &salt,
            PBKDF2_ITERATIONS,
            chain_key.as_mut(),
        )
        .map_err(|_| CipherError::KeyDerivationFailed)?;

        Ok(Self {
            salt,
            chain_key,
            step: 0,
        })
    }

    /// Rebuild the state a writer had after producing the snapshot at `step`.
    ///
    /// Used to keep editing an existing pad: the next `encrypt` continues at
    /// `step + 1` under the pad's original salt.
    pub fn resume(password: &str, salt: [u8; SALT_SIZE], step: u64) -> Result<Self, CipherError> {
        if step > MAX_STEP {
            return Err(CipherError::KeyDerivationFailed);
        }
        let mut state = Self::init(password, Some(salt))?;
        while state.step < step {
            let (_discarded, next) = state.turn()?;
            state = next;
        }
        Ok(state)
    }

    /// Salt this chain was derived from.
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    /// Number of turns taken since `init`.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Advance the chain by one step.
    ///
    /// Returns the message key for the new step together with the new state.
    pub fn turn(self) -> Result<(MessageKey, RatchetState), CipherError> {
        let hkdf = Hkdf::<Sha256>::new(Some(self.salt.as_slice()), self.chain_key.as_slice());

        let mut message_key = Zeroizing::new([0u8; KEY_SIZE]);
        hkdf.expand(MESSAGE_KEY_INFO, message_key.as_mut())
            .map_err(|_| CipherError::KeyDerivationFailed)?;

        let mut next_chain_key = Zeroizing::new([0u8; KEY_SIZE]);
        hkdf.expand(CHAIN_KEY_INFO, next_chain_key.as_mut())
            .map_err(|_| CipherError::KeyDerivationFailed)?;

        let next = RatchetState {
            salt: self.salt,
            chain_key: next_chain_key,
            step: self.step + 1,
        };
        Ok((MessageKey(message_key), next))
    }

    /// Encrypt one snapshot, advancing the ratchet.
    pub fn encrypt(self, plaintext: &str) -> Result<(EncryptedPayload, RatchetState), CipherError> {
        let (message_key, next) = self.turn()?;

        let mut iv = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut iv);

        let cipher = Aes256Gcm::new_from_slice(message_key.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;
        let aad = associated_data(&next.salt, next.step);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|_| CipherError::EncryptionFailed)?;

        let payload = EncryptedPayload {
            ciphertext,
            iv,
            salt: next.salt,
            step: next.step,
        };
        Ok((payload, next))
    }
}

/// Decrypt a snapshot by replaying the key schedule from the password.
pub fn decrypt(password: &str, payload: &EncryptedPayload) -> Result<String, CipherError> {
    if payload.step == 0 || payload.step > MAX_STEP {
        return Err(CipherError::DecryptionFailed);
    }

    let mut state = RatchetState::init(password, Some(payload.salt))?;
    let message_key = loop {
        let (key, next) = state.turn()?;
        state = next;
        if state.step == payload.step {
            break key;
        }
    };

    let cipher = Aes256Gcm::new_from_slice(message_key.as_bytes())
        .map_err(|_| CipherError::DecryptionFailed)?;
    let aad = associated_data(&payload.salt, payload.step);
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(&payload.iv),
                Payload {
                    msg: &payload.ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| CipherError::DecryptionFailed)?,
    );

    String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::DecryptionFailed)
}

/// Decrypt for display, substituting [`UNREADABLE_PLACEHOLDER`] on failure.
pub fn decrypt_or_placeholder(password: &str, payload: &EncryptedPayload) -> String {
    match decrypt(password, payload) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::warn!("Pad snapshot at step {} is unreadable: {}", payload.step, e);
            UNREADABLE_PLACEHOLDER.to_string()
        }
    }
}

/// Salt and step are authenticated so a payload cannot be replayed under
/// different chain parameters.
fn associated_data(salt: &[u8; SALT_SIZE], step: u64) -> Vec<u8> {
    let mut aad = Vec::with_capacity(SALT_SIZE + 8);
    aad.extend_from_slice(salt);
    aad.extend_from_slice(&step.to_be_bytes());
    aad
}
