//! Credential vault: passphrase-based authenticated encryption of the
//! user's API key for storage in an untrusted-at-rest location.
//!
//! Key derivation is PBKDF2-HMAC-SHA256 at 200,000 iterations — slow enough
//! to price offline dictionary attacks against a stolen store, fast enough
//! that an interactive unlock stays sub-second. The cipher is AES-256-GCM,
//! so any modification of the stored bytes fails authentication instead of
//! decrypting into garbage.
//!
//! Every function here is pure per call: fresh salt and iv per encryption,
//! the derived key never outlives the call, no caching.

mod payload;

pub use payload::{EncryptedPayload, PAYLOAD_VERSION};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Salt length fed to the KDF.
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length (96 bits, the standard size).
pub const IV_LEN: usize = 12;
/// PBKDF2-HMAC-SHA256 iteration count.
pub const KDF_ITERATIONS: u32 = 200_000;

const KEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("salt must be exactly {SALT_LEN} bytes, got {0}")]
    InvalidSaltLength(usize),

    #[error("stored payload is malformed: {0}")]
    InvalidPayload(String),

    /// Wrong passphrase and tampered data collapse into one error: keeping
    /// them apart would hand an oracle to a passphrase-guessing attacker.
    #[error("failed to decrypt: invalid passphrase or corrupted data")]
    AuthenticationFailed,

    #[error("secure random source unavailable: {0}")]
    CryptoUnavailable(String),
}

/// Cryptographically secure randomness as an injected capability, so tests
/// can substitute deterministic vectors.
pub trait RandomSource: Send + Sync {
    fn try_fill(&self, buf: &mut [u8]) -> Result<(), VaultError>;
}

/// Production source backed by the operating system RNG.
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_fill(&self, buf: &mut [u8]) -> Result<(), VaultError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| VaultError::CryptoUnavailable(e.to_string()))
    }
}

/// Derives a 256-bit AES key from (passphrase, salt).
///
/// The key is wrapped in [`Zeroizing`] so it is wiped when the enclosing
/// encrypt/decrypt call returns. Never cached, never reused across salts.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidSaltLength(salt.len()));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, KDF_ITERATIONS, &mut key[..]);
    Ok(key)
}

/// Encrypts `plaintext` under a key derived from `passphrase`.
///
/// Salt and iv are drawn fresh from `rng` on every call, so encrypting the
/// same input twice yields unrelated payloads that decrypt identically.
pub fn encrypt(
    plaintext: &str,
    passphrase: &str,
    rng: &dyn RandomSource,
) -> Result<EncryptedPayload, VaultError> {
    let mut salt = [0u8; SALT_LEN];
    rng.try_fill(&mut salt)?;
    let mut iv = [0u8; IV_LEN];
    rng.try_fill(&mut iv)?;

    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|_| VaultError::CryptoUnavailable("AES-GCM encryption failed".into()))?;

    Ok(EncryptedPayload::from_parts(&salt, &iv, &ciphertext))
}

/// Decrypts a payload, returning the exact original plaintext.
///
/// Either the whole plaintext comes back or the call fails; there is no
/// partial output. Tag verification failure — wrong passphrase or any
/// flipped bit in salt, iv, or ciphertext — is [`VaultError::AuthenticationFailed`].
pub fn decrypt(payload: &EncryptedPayload, passphrase: &str) -> Result<String, VaultError> {
    let decoded = payload.decode()?;

    let key = derive_key(passphrase, &decoded.salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&decoded.iv), decoded.ciphertext.as_slice())
        .map_err(|_| VaultError::AuthenticationFailed)?;

    String::from_utf8(plaintext)
        .map_err(|_| VaultError::InvalidPayload("plaintext is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    /// Deterministic source for vector-style tests: repeats a fixed byte.
    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn try_fill(&self, buf: &mut [u8]) -> Result<(), VaultError> {
            buf.fill(self.0);
            Ok(())
        }
    }

    /// Source that always fails, to exercise the CryptoUnavailable path.
    struct BrokenRandom;

    impl RandomSource for BrokenRandom {
        fn try_fill(&self, _buf: &mut [u8]) -> Result<(), VaultError> {
            Err(VaultError::CryptoUnavailable("entropy pool offline".into()))
        }
    }

    #[test]
    fn test_roundtrip() {
        let payload = encrypt("AIza-example-key-123", "correct horse", &OsRandom).unwrap();
        let plaintext = decrypt(&payload, "correct horse").unwrap();
        assert_eq!(plaintext, "AIza-example-key-123");
    }

    #[test]
    fn test_roundtrip_empty_string() {
        let payload = encrypt("", "pw", &OsRandom).unwrap();
        assert_eq!(decrypt(&payload, "pw").unwrap(), "");
    }

    #[test]
    fn test_roundtrip_multibyte() {
        let secret = "clé-секрет-鍵 🔑";
        let payload = encrypt(secret, "pâssphrase-日本語", &OsRandom).unwrap();
        assert_eq!(decrypt(&payload, "pâssphrase-日本語").unwrap(), secret);
    }

    #[test]
    fn test_wrong_passphrase_fails_authentication() {
        let payload = encrypt("secret", "pw1", &OsRandom).unwrap();
        assert_eq!(
            decrypt(&payload, "pw2"),
            Err(VaultError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_encrypt_is_nondeterministic() {
        let a = encrypt("x", "pw", &OsRandom).unwrap();
        let b = encrypt("x", "pw", &OsRandom).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_fixed_random_is_reproducible() {
        let a = encrypt("x", "pw", &FixedRandom(0xAB)).unwrap();
        let b = encrypt("x", "pw", &FixedRandom(0xAB)).unwrap();
        assert_eq!(a, b);
        assert_eq!(decrypt(&a, "pw").unwrap(), "x");
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let payload = encrypt("secret", "pw", &OsRandom).unwrap();
        let mut data = BASE64.decode(&payload.data).unwrap();
        for i in 0..data.len() {
            data[i] ^= 0x01;
            let tampered = EncryptedPayload {
                data: BASE64.encode(&data),
                ..payload.clone()
            };
            assert_eq!(
                decrypt(&tampered, "pw"),
                Err(VaultError::AuthenticationFailed),
                "flipping byte {i} must not decrypt"
            );
            data[i] ^= 0x01;
        }
    }

    #[test]
    fn test_tampered_salt_fails_authentication() {
        let payload = encrypt("secret", "pw", &OsRandom).unwrap();
        let mut salt = BASE64.decode(&payload.salt).unwrap();
        salt[0] ^= 0x01;
        let tampered = EncryptedPayload {
            salt: BASE64.encode(&salt),
            ..payload
        };
        assert_eq!(
            decrypt(&tampered, "pw"),
            Err(VaultError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_tampered_iv_fails_authentication() {
        let payload = encrypt("secret", "pw", &OsRandom).unwrap();
        let mut iv = BASE64.decode(&payload.iv).unwrap();
        iv[0] ^= 0x01;
        let tampered = EncryptedPayload {
            iv: BASE64.encode(&iv),
            ..payload
        };
        assert_eq!(
            decrypt(&tampered, "pw"),
            Err(VaultError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_empty_fields_are_invalid_payload() {
        let payload = EncryptedPayload {
            version: 1,
            salt: String::new(),
            iv: String::new(),
            data: String::new(),
        };
        assert!(matches!(
            decrypt(&payload, "pw"),
            Err(VaultError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_bad_base64_is_invalid_payload() {
        let mut payload = encrypt("secret", "pw", &OsRandom).unwrap();
        payload.salt = "not base64!!".into();
        assert!(matches!(
            decrypt(&payload, "pw"),
            Err(VaultError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_short_salt_is_invalid_payload() {
        let mut payload = encrypt("secret", "pw", &OsRandom).unwrap();
        payload.salt = BASE64.encode([0u8; 8]);
        assert!(matches!(
            decrypt(&payload, "pw"),
            Err(VaultError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_unknown_version_is_invalid_payload() {
        let mut payload = encrypt("secret", "pw", &OsRandom).unwrap();
        payload.version = 2;
        assert!(matches!(
            decrypt(&payload, "pw"),
            Err(VaultError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_derive_rejects_bad_salt_length() {
        assert_eq!(
            derive_key("pw", &[0u8; 8]).unwrap_err(),
            VaultError::InvalidSaltLength(8)
        );
    }

    #[test]
    fn test_broken_random_source_is_crypto_unavailable() {
        assert!(matches!(
            encrypt("secret", "pw", &BrokenRandom),
            Err(VaultError::CryptoUnavailable(_))
        ));
    }

    #[test]
    fn test_payload_serializes_with_short_field_names() {
        let payload = encrypt("secret", "pw", &OsRandom).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["v"], 1);
        assert!(json["salt"].is_string());
        assert!(json["iv"].is_string());
        assert!(json["data"].is_string());
        let back: EncryptedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
