//! # Wallet Signature Verification
//!
//! Wallets sign human-readable messages under the EIP-191 "personal message"
//! convention:
//!
//! ```text
//! digest = keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)
//! ```
//!
//! where `len` is the decimal byte length. The signature is 65 bytes,
//! `r (32) || s (32) || v (1)`, with `v` either `27/28` or the raw recovery
//! id `0/1`. The signer's address is the last 20 bytes of the Keccak-256 of
//! the uncompressed public key without its `0x04` prefix.
//!
//! [`verify_message`] never errors: any malformed input, failed recovery, or
//! address mismatch is simply `false`.

use bshop_core::EvmAddress;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

use crate::error::CryptoError;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Length of a recoverable signature in bytes.
pub const SIGNATURE_LEN: usize = 65;

/// Keccak-256 (the pre-standard SHA-3 variant used by Ethereum).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Digest a wallet signs for `message`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derive the account address that owns `public_key`.
pub fn address_from_public_key(public_key: &PublicKey) -> EvmAddress {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    EvmAddress::from_bytes(bytes)
}

/// Recover the address that produced `signature_hex` over `message`.
pub fn recover_address(message: &str, signature_hex: &str) -> Result<EvmAddress, CryptoError> {
    let raw = decode_signature(signature_hex)?;
    let recovery_byte = match raw[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        v => {
            return Err(CryptoError::MalformedSignature(format!(
                "unsupported recovery byte {v}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_i32(i32::from(recovery_byte))
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let signature = RecoverableSignature::from_compact(&raw[..64], recovery_id)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    let digest = Message::from_digest(personal_message_hash(message.as_bytes()));
    let public_key = Secp256k1::verification_only()
        .recover_ecdsa(&digest, &signature)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(address_from_public_key(&public_key))
}

/// Check that `address` signed exactly `message`.
pub fn verify_message(address: &EvmAddress, message: &str, signature_hex: &str) -> bool {
    match recover_address(message, signature_hex) {
        Ok(recovered) => recovered == *address,
        Err(_) => false,
    }
}

/// Sign `message` as a wallet would, returning `0x`-prefixed hex with `v` in `{27, 28}`.
///
/// Used by tooling and tests that act as the client side of the download flow.
pub fn sign_message(secret_key: &[u8; 32], message: &str) -> Result<String, CryptoError> {
    let secret = SecretKey::from_slice(secret_key)
        .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
    let digest = Message::from_digest(personal_message_hash(message.as_bytes()));
    let signature = Secp256k1::signing_only().sign_ecdsa_recoverable(&digest, &secret);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&compact);
    // to_i32 is always 0..=3; wallets only ever emit 0 or 1.
    out[64] = 27 + recovery_id.to_i32() as u8;
    Ok(format!("0x{}", hex::encode(out)))
}

/// Address controlled by `secret_key`.
pub fn address_from_secret(secret_key: &[u8; 32]) -> Result<EvmAddress, CryptoError> {
    let secret = SecretKey::from_slice(secret_key)
        .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
    let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
    Ok(address_from_public_key(&public_key))
}

fn decode_signature(signature_hex: &str) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let trimmed = signature_hex.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_part.len() != SIGNATURE_LEN * 2 {
        return Err(CryptoError::MalformedSignature(format!(
            "expected {} hex chars, got {}",
            SIGNATURE_LEN * 2,
            hex_part.len()
        )));
    }
    let mut raw = [0u8; SIGNATURE_LEN];
    hex::decode_to_slice(hex_part, &mut raw)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    Ok(raw)
}
