//! Wire form of one encrypted pad snapshot.

use serde::{Deserialize, Serialize};

use super::{NONCE_SIZE, SALT_SIZE};

/// One point-in-time encrypted snapshot of a pad.
///
/// Everything here is safe to hand to the server: the chain and message keys
/// never leave the client, only the values needed to rebuild them from the
/// password. Byte fields travel as standard base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// AES-GCM ciphertext with the 16-byte tag appended.
    #[serde(with = "base64_vec")]
    pub ciphertext: Vec<u8>,
    /// Random nonce, unique per encryption.
    #[serde(with = "base64_array")]
    pub iv: [u8; NONCE_SIZE],
    /// PBKDF2 salt, fixed for the lifetime of a pad.
    #[serde(with = "base64_array")]
    pub salt: [u8; SALT_SIZE],
    /// Ratchet step whose message key encrypted this snapshot (starts at 1).
    pub step: u64,
}

/// Salt and step of the newest stored snapshot of a pad.
///
/// Members carry it so the next save continues the same chain: the salt
/// never changes and each save moves the step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadHead {
    #[serde(with = "base64_array")]
    pub salt: [u8; SALT_SIZE],
    pub step: u64,
}

impl PadHead {
    /// Whether `payload` is a valid successor of this head.
    pub fn is_followed_by(&self, payload: &EncryptedPayload) -> bool {
        payload.salt == self.salt && payload.step > self.step
    }
}

impl From<&EncryptedPayload> for PadHead {
    fn from(payload: &EncryptedPayload) -> Self {
        Self {
            salt: payload.salt,
            step: payload.step,
        }
    }
}

mod base64_vec {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_array {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64.decode(encoded).map_err(serde::de::Error::custom)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::invalid_length(len, &"a fixed-size byte field"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_uses_base64_fields() {
        // テスト項目: バイト列フィールドが base64 文字列として直列化される
        // given (前提条件):
        let payload = EncryptedPayload {
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
            iv: [1u8; NONCE_SIZE],
            salt: [2u8; SALT_SIZE],
            step: 3,
        };

        // when (操作):
        let json = serde_json::to_value(&payload).unwrap();

        // then (期待する結果):
        assert_eq!(json["ciphertext"], "3q2+7w==");
        assert_eq!(json["step"], 3);
        let restored: EncryptedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn test_payload_rejects_wrong_salt_length() {
        // テスト項目: salt の長さが不正な場合はデシリアライズに失敗する
        // given (前提条件):
        let json = r#"{"ciphertext":"AAAA","iv":"AAAAAAAAAAAAAAAA","salt":"AAAA","step":1}"#;

        // when (操作):
        let result = serde_json::from_str::<EncryptedPayload>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_head_accepts_only_later_steps_on_same_salt() {
        // テスト項目: 同じソルトで step が進んだ暗号文だけが後継として認められる
        // given (前提条件):
        let stored = EncryptedPayload {
            ciphertext: vec![1],
            iv: [0u8; NONCE_SIZE],
            salt: [7u8; SALT_SIZE],
            step: 4,
        };
        let head = PadHead::from(&stored);

        // when (操作):
        let next = EncryptedPayload { step: 5, ..stored.clone() };
        let same = stored.clone();
        let older = EncryptedPayload { step: 3, ..stored.clone() };
        let forked = EncryptedPayload {
            salt: [8u8; SALT_SIZE],
            step: 9,
            ..stored.clone()
        };

        // then (期待する結果):
        assert!(head.is_followed_by(&next));
        assert!(!head.is_followed_by(&same));
        assert!(!head.is_followed_by(&older));
        assert!(!head.is_followed_by(&forked));
    }
}
