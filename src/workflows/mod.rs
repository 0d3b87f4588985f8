//! Investor research workflow
//!
//! One request runs these steps, in order, each persisted as it changes:
//!
//! | Step | Runs when |
//! |------|-----------|
//! | `parse_query` | always |
//! | `fetch_airtable` | always (empty without a source project) |
//! | `fetch_apollo` | industry, location or investor type was extracted |
//! | `merge_filter` | always; ticket filter only with a bound |
//! | `export_csv` | always |
//! | `calendar` | `include_calendar` |
//! | `email_draft` | `include_email_draft` |
//! | `create_project` | `create_project`, not a dry run, and a new project name |
//!
//! # Usage
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(collaborators, store, config.orchestration.clone());
//! let response = orchestrator
//!     .orchestrate(OrchestrateRequest::new("fintech investors in Berlin"))
//!     .await;
//! println!("{} -> {}", response.run_id, response.status);
//! ```

pub mod engine;

pub use engine::Orchestrator;
