//! # Middleware Stack
//!
//! - [`metrics`]: request counters and latency histograms, plus the domain
//!   counters recorded by the delivery and upload flows.
//!
//! Request tracing uses `tower_http::trace::TraceLayer` directly in
//! [`crate::app`].

pub mod metrics;
