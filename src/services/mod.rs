//! External collaborators of the orchestrator
//!
//! Each collaborator is a trait so the orchestrator can be driven by real
//! integrations in production and by mocks in tests:
//!
//! | Trait | Production implementation |
//! |-------|---------------------------|
//! | [`QueryInterpreter`] | [`openai::OpenAiInterpreter`] |
//! | [`InvestorSource`] (registry) | [`airtable::AirtableClient`] |
//! | [`InvestorSource`] (open search) | [`apollo::ApolloSource`] |
//! | [`Exporter`] | [`crate::utils::csv_export::CsvExporter`] |
//! | [`AvailabilityProvider`] | [`calendar::CalendarAvailability`] |
//! | [`Drafter`] | [`email::EmailDrafter`] |
//! | [`ProjectCreator`] | [`airtable::AirtableClient`] |
//!
//! All of them are built once at startup into a [`Collaborators`] bundle and
//! handed to [`crate::workflows::Orchestrator::new`].

pub mod airtable;
pub mod apollo;
pub mod calendar;
pub mod email;
pub mod openai;

use crate::types::{AvailabilitySlot, EmailDraft, Investor, ParsedQuery, Result};
use crate::utils::csv_export::CsvExporter;
use crate::utils::toml_config::JockeyConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns free text into structured criteria.
#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    /// Returns an `AppError::Interpretation` when no usable criteria can be produced.
    async fn interpret(&self, query: &str) -> Result<ParsedQuery>;
}

/// Reads investor records for a set of criteria.
///
/// Implementations never fail: internal errors are logged and surface as an
/// empty list so the run can continue with partial data.
#[async_trait]
pub trait InvestorSource: Send + Sync {
    /// Short provenance tag, e.g. `"airtable"`.
    fn name(&self) -> &str;

    async fn fetch(&self, query: &ParsedQuery, max_results: usize) -> Vec<Investor>;
}

/// Durably writes records and returns their location.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, investors: &[Investor]) -> Result<String>;
}

/// Proposes meeting windows.
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    async fn suggest(&self) -> Result<Vec<AvailabilitySlot>>;
}

/// Builds an email draft. Must be free of side effects.
pub trait Drafter: Send + Sync {
    fn draft(
        &self,
        investors: &[Investor],
        availability: Option<&[AvailabilitySlot]>,
        query: &ParsedQuery,
    ) -> Result<EmailDraft>;
}

/// Registers a named project grouping the given investors.
#[async_trait]
pub trait ProjectCreator: Send + Sync {
    /// Returns the new project id, or `None` when creation did not happen.
    async fn create_project(&self, name: &str, investors: &[Investor]) -> Option<String>;
}

/// Every collaborator the orchestrator needs, constructed once per process.
#[derive(Clone)]
pub struct Collaborators {
    pub interpreter: Arc<dyn QueryInterpreter>,
    pub internal_source: Arc<dyn InvestorSource>,
    pub external_source: Arc<dyn InvestorSource>,
    pub exporter: Arc<dyn Exporter>,
    pub availability: Arc<dyn AvailabilityProvider>,
    pub drafter: Arc<dyn Drafter>,
    pub projects: Arc<dyn ProjectCreator>,
}

impl Collaborators {
    /// Build the production collaborators from configuration.
    ///
    /// A single HTTP client is shared by all network integrations.
    pub fn from_config(config: &JockeyConfig) -> Self {
        let http = reqwest::Client::new();
        let airtable = Arc::new(airtable::AirtableClient::new(http.clone(), &config.airtable));

        Self {
            interpreter: Arc::new(openai::OpenAiInterpreter::new(http.clone(), &config.openai)),
            internal_source: airtable.clone(),
            external_source: Arc::new(apollo::ApolloSource::new(http, &config.apollo)),
            exporter: Arc::new(CsvExporter::new(&config.storage.exports_dir)),
            availability: Arc::new(calendar::CalendarAvailability::new(&config.calendar)),
            drafter: Arc::new(email::EmailDrafter),
            projects: airtable,
        }
    }
}
