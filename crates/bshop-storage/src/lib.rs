//! # bshop-storage: Content-Addressed Storage
//!
//! Objects live on a public content-addressed network and are reached
//! through two HTTP services:
//!
//! - a **gateway** serving `GET {gateway}/ipfs/{cid}`, used by downloads;
//! - a **storage node** accepting `POST {node}/api/v0/add` with a bearer
//!   API key, used by uploads. Its response's `Hash` is the new content id.
//!
//! Both are reached through traits ([`ObjectFetcher`], [`ObjectUploader`])
//! so the delivery service can run against [`MemoryObjectStore`] in tests.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod upload;

pub use error::StorageError;
pub use gateway::{GatewayConfig, GatewayFetcher, ObjectFetcher};
pub use memory::MemoryObjectStore;
pub use upload::{ObjectUploader, StorageNodeConfig, StorageUploader};
