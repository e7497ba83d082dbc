//! # bshop-chain: On-Chain Access Checks
//!
//! Answers one question: has this buyer purchased this content? The answer
//! comes from a marketplace contract read over EVM JSON-RPC. Nothing here
//! signs or sends transactions.
//!
//! The oracle distinguishes three outcomes internally ([`AccessResult`]):
//! a definite grant, a definite denial, and "unknown" when the RPC call or
//! contract read fails. Callers at the HTTP boundary collapse `Unknown` into
//! a denial so that an RPC outage never releases paid content.

pub mod access;
pub mod error;
pub mod evm;

pub use access::{AccessOracle, AccessResult, StaticAccessOracle};
pub use error::ChainError;
pub use evm::{EvmAccessOracle, EvmOracleConfig, HAS_BUYER_ACCESS_SIGNATURE};
