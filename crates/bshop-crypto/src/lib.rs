//! # bshop-crypto: Cryptographic Primitives
//!
//! - **Wallet signatures**: recover the signer of an EIP-191 personal
//!   message (secp256k1 + Keccak-256) and compare it with a claimed address.
//! - **Content sealing**: AES-256-GCM with a per-object random key and nonce,
//!   laid out as `ciphertext || tag`.
//! - **Decryption outcomes**: an explicit [`DecryptOutcome`] so callers decide
//!   what an authentication failure means instead of inheriting a silent
//!   fallback.
//!
//! ## Crate Policy
//!
//! - Depends only on `bshop-core` internally.
//! - Tests use real keys and real AEAD, never mocks.
//! - Secret key bytes are zeroized on drop.

pub mod aead;
pub mod error;
pub mod outcome;
pub mod signature;

pub use aead::{decrypt_content, open, seal, ContentKey, KeyAlgorithm, NONCE_LEN, TAG_LEN};
pub use error::CryptoError;
pub use outcome::{DecryptFailure, DecryptOutcome, PassThroughReason};
pub use signature::{
    address_from_secret, keccak256, recover_address, sign_message, verify_message,
};
