//! # bshop-core: Foundational Types
//!
//! Defines the identifier newtypes and protocol constants shared by every
//! other crate in the workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ContentId` and `EvmAddress` are
//!    validated on construction. No bare strings cross a crate boundary.
//!
//! 2. **One message format.** The string a wallet signs to authorize a
//!    download is built only by [`download_message`], so the verifier and
//!    every client agree on it byte for byte.
//!
//! 3. **Explicit chain selection.** [`ChainSelection`] names the network the
//!    access oracle queries. The test network is the default.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bshop-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod chain;
pub mod error;
pub mod identity;
pub mod message;

pub use chain::ChainSelection;
pub use error::ValidationError;
pub use identity::{ContentId, EvmAddress};
pub use message::{download_message, DownloadRequest, DOWNLOAD_MESSAGE_PREFIX};
