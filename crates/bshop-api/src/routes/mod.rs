//! # Route Modules
//!
//! | Route | Module |
//! |---|---|
//! | `POST /download/{cid}` | [`download`] |
//! | `POST /upload` | [`upload`] |

pub mod download;
pub mod upload;
