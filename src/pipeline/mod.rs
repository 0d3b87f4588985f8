//! Record pipeline
//!
//! Combines investor lists coming from independent sources into a single
//! deduplicated list and narrows it by ticket size.
//!
//! # Usage
//!
//! ```rust
//! use jockey::pipeline::merge::{apply_ticket_filter, merge_and_dedupe};
//! use jockey::types::{Investor, TicketSize};
//!
//! let merged = merge_and_dedupe(&[Investor::named("Acme")], &[Investor::named("acme ")]);
//! assert_eq!(merged.len(), 1);
//!
//! let bounds = TicketSize { minimum: Some(1_000_000.0), maximum: None };
//! assert_eq!(apply_ticket_filter(merged, &bounds).len(), 1);
//! ```

/// Merge, dedupe and range filtering.
pub mod merge;

pub use merge::{apply_ticket_filter, dedupe_key, merge_and_dedupe};
