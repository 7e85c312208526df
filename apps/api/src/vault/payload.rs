//! Persisted representation of a vault-protected secret.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{VaultError, IV_LEN, SALT_LEN};

/// Current payload schema version.
pub const PAYLOAD_VERSION: u32 = 1;

/// The self-describing, portable form of an encrypted secret.
///
/// All byte fields are base64-encoded so the payload serializes to a plain
/// JSON object (`{v, salt, iv, data}`) suitable for a string-valued store.
/// `data` is the AES-GCM ciphertext with the authentication tag appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(rename = "v")]
    pub version: u32,
    pub salt: String,
    pub iv: String,
    pub data: String,
}

impl EncryptedPayload {
    pub(super) fn from_parts(salt: &[u8], iv: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            salt: BASE64.encode(salt),
            iv: BASE64.encode(iv),
            data: BASE64.encode(ciphertext),
        }
    }

    /// Decodes and validates the payload fields.
    ///
    /// Rejects unknown versions, invalid base64, a salt that does not decode
    /// to 16 bytes, an iv that does not decode to 12 bytes, and a ciphertext
    /// too short to even hold a GCM tag. None of these checks touch the
    /// passphrase: a payload that passes can still fail authentication.
    pub(super) fn decode(&self) -> Result<DecodedPayload, VaultError> {
        if self.version != PAYLOAD_VERSION {
            return Err(VaultError::InvalidPayload(format!(
                "unsupported payload version {}",
                self.version
            )));
        }
        let salt = decode_field("salt", &self.salt)?;
        if salt.len() != SALT_LEN {
            return Err(VaultError::InvalidPayload(format!(
                "salt decodes to {} bytes, expected {SALT_LEN}",
                salt.len()
            )));
        }
        let iv = decode_field("iv", &self.iv)?;
        if iv.len() != IV_LEN {
            return Err(VaultError::InvalidPayload(format!(
                "iv decodes to {} bytes, expected {IV_LEN}",
                iv.len()
            )));
        }
        let ciphertext = decode_field("data", &self.data)?;
        // AES-GCM output is always at least the 16-byte tag.
        if ciphertext.len() < 16 {
            return Err(VaultError::InvalidPayload(
                "ciphertext is shorter than the authentication tag".into(),
            ));
        }
        Ok(DecodedPayload {
            salt,
            iv,
            ciphertext,
        })
    }
}

pub(super) struct DecodedPayload {
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, VaultError> {
    if value.is_empty() {
        return Err(VaultError::InvalidPayload(format!("missing field {name}")));
    }
    BASE64
        .decode(value)
        .map_err(|e| VaultError::InvalidPayload(format!("field {name} is not valid base64: {e}")))
}
