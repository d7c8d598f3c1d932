//! review-grabber - Amazon product review extraction CLI
//!
//! Walks a product's paginated review listing with TLS fingerprint
//! emulation, accumulates the records it recovers, and persists them
//! to SQLite with CSV export.

pub mod commands;
pub mod config;
pub mod reviews;
pub mod store;

pub use config::{Config, SparsePagePolicy};
pub use reviews::models::{GrabOutcome, GrabSummary, Review, StopReason};
pub use store::ReviewStore;
