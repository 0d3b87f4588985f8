//! # Jockey - investor research orchestrator
//!
//! Turns a natural language request ("seed fintech investors in Berlin with
//! 2-5M tickets") into a deduplicated, filtered investor list, a CSV export,
//! suggested meeting slots and an email draft. Every run is persisted step by
//! step so it can be polled while it executes and inspected afterwards.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use jockey::{runs, Collaborators, JockeyConfig, OrchestrateRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JockeyConfig::load_or_default("jockey.toml")?;
//!     let store = runs::open_store(&config.storage).await?;
//!     let orchestrator = Orchestrator::new(
//!         Collaborators::from_config(&config),
//!         store,
//!         config.orchestration.clone(),
//!     );
//!
//!     let response = orchestrator
//!         .orchestrate(OrchestrateRequest::new("fintech investors in Berlin"))
//!         .await;
//!     println!("{} {}", response.run_id, response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records, requests, run state and error handling
//! - [`pipeline`] - Merge, dedupe and ticket filtering
//! - [`runs`] - Run persistence (file and in-memory stores)
//! - [`services`] - Collaborator traits and their OpenAI, Airtable, Apollo,
//!   calendar and email implementations
//! - [`workflows`] - The run state machine
//! - [`utils`] - TOML configuration, CSV export, atomic file writes
//! - [`cli`] - Command line surface

#![warn(rustdoc::missing_crate_level_docs)]

/// Command line parsing, handlers and colored output.
pub mod cli;
/// Merge-dedupe-filter engine.
pub mod pipeline;
/// Run record persistence.
pub mod runs;
/// External collaborators of the orchestrator.
pub mod services;
/// Core types (records, run state, errors).
pub mod types;
/// Configuration and file utilities.
pub mod utils;
/// The orchestration state machine.
pub mod workflows;

// Re-export commonly used types
pub use runs::{FileRunStore, MemoryRunStore, RunStore};
pub use services::Collaborators;
pub use types::{
    AppError, Investor, OrchestrateOptions, OrchestrateRequest, OrchestrateResponse,
    OrchestrateResult, ParsedQuery, Result, RunRecord, RunStatus, Step,
};
pub use utils::toml_config::{ConfigError, JockeyConfig};
pub use workflows::Orchestrator;
