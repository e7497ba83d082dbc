//! # AES-256-GCM Content Sealing
//!
//! Each uploaded object gets its own random 256-bit key and 96-bit nonce.
//! Sealed bytes are laid out as:
//!
//! ```text
//! ciphertext (len = plaintext len) || tag (16 bytes)
//! ```
//!
//! There is no nonce prefix; the nonce lives beside the key in the key
//! vault. Every stored object must keep the tag at the end.

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::outcome::{DecryptFailure, DecryptOutcome, PassThroughReason};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM tag length in bytes (128-bit tag).
pub const TAG_LEN: usize = 16;

/// Smallest input that is treated as sealed content.
pub const MIN_SEALED_LEN: usize = TAG_LEN + 1;

const AES_256_GCM_TAG: &str = "aes-256-gcm";

/// Algorithm tag stored with each key record.
///
/// Parsed case-insensitively; always serialized as `aes-256-gcm` so records
/// written by earlier deployments keep matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyAlgorithm {
    Aes256Gcm,
    /// A tag this build does not implement. Content under it passes through.
    Other(String),
}

impl KeyAlgorithm {
    pub fn parse(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case(AES_256_GCM_TAG) {
            Self::Aes256Gcm
        } else {
            Self::Other(tag.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Aes256Gcm => AES_256_GCM_TAG,
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for KeyAlgorithm {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<KeyAlgorithm> for String {
    fn from(value: KeyAlgorithm) -> Self {
        value.as_str().to_string()
    }
}

/// Per-object key and nonce. Key bytes are zeroized on drop.
#[derive(Clone)]
pub struct ContentKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    nonce: [u8; NONCE_LEN],
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentKey")
            .field("key", &"[REDACTED]")
            .field("nonce", &hex::encode(self.nonce))
            .finish()
    }
}

impl ContentKey {
    /// Draw a fresh key and nonce from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut key[..]);
        OsRng.fill_bytes(&mut nonce);
        Self { key, nonce }
    }

    pub fn from_bytes(key: [u8; KEY_LEN], nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
            nonce,
        }
    }

    /// Decode base64 key material as persisted in the key vault.
    pub fn from_base64(key_b64: &str, nonce_b64: &str) -> Result<Self, CryptoError> {
        let key_raw = Zeroizing::new(
            BASE64
                .decode(key_b64.trim())
                .map_err(|e| CryptoError::InvalidKeyMaterial(format!("key: {e}")))?,
        );
        let nonce_raw = BASE64
            .decode(nonce_b64.trim())
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("iv: {e}")))?;

        if key_raw.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "key must be {KEY_LEN} bytes, got {}",
                key_raw.len()
            )));
        }
        if nonce_raw.len() != NONCE_LEN {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "iv must be {NONCE_LEN} bytes, got {}",
                nonce_raw.len()
            )));
        }

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&key_raw);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_raw);
        Ok(Self { key, nonce })
    }

    pub fn key_base64(&self) -> String {
        BASE64.encode(&self.key[..])
    }

    pub fn nonce_base64(&self) -> String {
        BASE64.encode(self.nonce)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
    }
}

/// Encrypt `plaintext`, returning `ciphertext || tag`.
pub fn seal(key: &ContentKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    key.cipher()
        .encrypt(Nonce::from_slice(&key.nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)
}

/// Decrypt `ciphertext || tag`.
pub fn open(key: &ContentKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < MIN_SEALED_LEN {
        return Err(CryptoError::TooShort(sealed.len()));
    }
    key.cipher()
        .decrypt(Nonce::from_slice(&key.nonce), sealed)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Run fetched bytes through decryption using a stored key record.
///
/// Never fails outright: unsupported algorithms and too-short input pass
/// through, and bad key material or a failed tag check come back as
/// [`DecryptOutcome::Failed`] carrying the original bytes.
pub fn decrypt_content(
    algorithm: &KeyAlgorithm,
    key_b64: &str,
    nonce_b64: &str,
    data: Vec<u8>,
) -> DecryptOutcome {
    if let KeyAlgorithm::Other(tag) = algorithm {
        return DecryptOutcome::PassThrough {
            bytes: data,
            reason: PassThroughReason::UnsupportedAlgorithm(tag.clone()),
        };
    }
    if data.len() < MIN_SEALED_LEN {
        let len = data.len();
        return DecryptOutcome::PassThrough {
            bytes: data,
            reason: PassThroughReason::TooShort(len),
        };
    }

    let key = match ContentKey::from_base64(key_b64, nonce_b64) {
        Ok(key) => key,
        Err(e) => {
            return DecryptOutcome::Failed {
                original: data,
                failure: DecryptFailure::InvalidKeyMaterial(e.to_string()),
            }
        }
    };

    match open(&key, &data) {
        Ok(plaintext) => DecryptOutcome::Plaintext(plaintext),
        Err(_) => DecryptOutcome::Failed {
            original: data,
            failure: DecryptFailure::AuthenticationFailed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_key() -> ContentKey {
        ContentKey::from_bytes([0x11; KEY_LEN], [0x22; NONCE_LEN])
    }

    #[test]
    fn sealed_layout_is_ciphertext_then_tag() {
        let sealed = seal(&fixed_key(), b"hello marketplace").unwrap();
        assert_eq!(sealed.len(), b"hello marketplace".len() + TAG_LEN);
    }

    #[test]
    fn open_rejects_tampered_tag() {
        let mut sealed = seal(&fixed_key(), b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert_eq!(open(&fixed_key(), &sealed), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn open_rejects_short_input() {
        assert_eq!(open(&fixed_key(), &[0u8; 16]), Err(CryptoError::TooShort(16)));
    }

    #[test]
    fn generated_keys_differ() {
        let a = ContentKey::generate();
        let b = ContentKey::generate();
        assert_ne!(a.key_base64(), b.key_base64());
        assert_ne!(a.nonce_base64(), b.nonce_base64());
    }

    #[test]
    fn base64_material_roundtrip() {
        let key = ContentKey::generate();
        let restored = ContentKey::from_base64(&key.key_base64(), &key.nonce_base64()).unwrap();
        let sealed = seal(&key, b"data").unwrap();
        assert_eq!(open(&restored, &sealed).unwrap(), b"data");
    }

    #[test]
    fn from_base64_checks_lengths() {
        let short_key = BASE64.encode([0u8; 16]);
        let nonce = BASE64.encode([0u8; NONCE_LEN]);
        assert!(matches!(
            ContentKey::from_base64(&short_key, &nonce),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        let key = BASE64.encode([0u8; KEY_LEN]);
        let long_nonce = BASE64.encode([0u8; 16]);
        assert!(matches!(
            ContentKey::from_base64(&key, &long_nonce),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        assert!(ContentKey::from_base64("***", &nonce).is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", fixed_key());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&hex::encode([0x11u8; KEY_LEN])));
    }

    #[test]
    fn algorithm_tag_parsing() {
        assert_eq!(KeyAlgorithm::parse("aes-256-gcm"), KeyAlgorithm::Aes256Gcm);
        assert_eq!(KeyAlgorithm::parse("AES-256-GCM"), KeyAlgorithm::Aes256Gcm);
        assert_eq!(
            KeyAlgorithm::parse("chacha20-poly1305"),
            KeyAlgorithm::Other("chacha20-poly1305".into())
        );
        assert_eq!(KeyAlgorithm::Aes256Gcm.to_string(), "aes-256-gcm");
    }

    #[test]
    fn algorithm_serde_uses_lowercase_tag() {
        let json = serde_json::to_string(&KeyAlgorithm::parse("AES-256-GCM")).unwrap();
        assert_eq!(json, "\"aes-256-gcm\"");
    }

    #[test]
    fn decrypt_content_recovers_plaintext() {
        let key = fixed_key();
        let sealed = seal(&key, b"the file").unwrap();
        let outcome = decrypt_content(
            &KeyAlgorithm::Aes256Gcm,
            &key.key_base64(),
            &key.nonce_base64(),
            sealed,
        );
        assert_eq!(outcome, DecryptOutcome::Plaintext(b"the file".to_vec()));
    }

    #[test]
    fn decrypt_content_passes_unknown_algorithm_through() {
        let outcome = decrypt_content(
            &KeyAlgorithm::parse("rot13"),
            "",
            "",
            b"0123456789abcdefXYZ".to_vec(),
        );
        assert_eq!(
            outcome,
            DecryptOutcome::PassThrough {
                bytes: b"0123456789abcdefXYZ".to_vec(),
                reason: PassThroughReason::UnsupportedAlgorithm("rot13".into()),
            }
        );
    }

    #[test]
    fn decrypt_content_reports_bad_key_material() {
        let outcome = decrypt_content(&KeyAlgorithm::Aes256Gcm, "!!", "!!", vec![9u8; 40]);
        match outcome {
            DecryptOutcome::Failed { original, failure } => {
                assert_eq!(original, vec![9u8; 40]);
                assert!(matches!(failure, DecryptFailure::InvalidKeyMaterial(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn decrypt_content_with_wrong_key_keeps_original_bytes() {
        let sealed = seal(&fixed_key(), b"secret").unwrap();
        let wrong = ContentKey::from_bytes([0x33; KEY_LEN], [0x22; NONCE_LEN]);
        let outcome = decrypt_content(
            &KeyAlgorithm::Aes256Gcm,
            &wrong.key_base64(),
            &wrong.nonce_base64(),
            sealed.clone(),
        );
        assert_eq!(
            outcome,
            DecryptOutcome::Failed {
                original: sealed,
                failure: DecryptFailure::AuthenticationFailed,
            }
        );
    }

    proptest! {
        #[test]
        fn seal_open_roundtrip(
            plaintext in proptest::collection::vec(any::<u8>(), 1..2048),
            key in proptest::array::uniform32(any::<u8>()),
            nonce in proptest::array::uniform12(any::<u8>()),
        ) {
            let key = ContentKey::from_bytes(key, nonce);
            let sealed = seal(&key, &plaintext).unwrap();
            let outcome = decrypt_content(
                &KeyAlgorithm::Aes256Gcm,
                &key.key_base64(),
                &key.nonce_base64(),
                sealed,
            );
            prop_assert_eq!(outcome, DecryptOutcome::Plaintext(plaintext));
        }

        #[test]
        fn short_input_is_returned_unchanged(
            data in proptest::collection::vec(any::<u8>(), 0..MIN_SEALED_LEN),
        ) {
            let key = fixed_key();
            let outcome = decrypt_content(
                &KeyAlgorithm::Aes256Gcm,
                &key.key_base64(),
                &key.nonce_base64(),
                data.clone(),
            );
            prop_assert_eq!(outcome.into_fail_soft_bytes(), data);
        }
    }
}
