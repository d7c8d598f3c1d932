//! Review engine: HTTP client, page parsing, pagination, and accumulation.

pub mod accumulator;
pub mod client;
pub mod grabber;
pub mod models;
pub mod parser;
pub mod selectors;

pub use accumulator::ReviewAccumulator;
pub use client::{PageResponse, ReviewClient, ReviewFetch};
pub use grabber::ReviewGrabber;
pub use models::{GrabOutcome, GrabSummary, Review, StopReason};
pub use parser::ReviewParser;
