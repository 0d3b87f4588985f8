use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============= Records =============

/// Unified investor record from the internal registry, open search, or mocks.
///
/// `name` is always populated. `id` may be absent for synthesized or
/// externally sourced rows; dedupe then falls back to website, LinkedIn URL
/// and finally name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub investor_type: Option<String>,
    #[serde(default)]
    pub industry_focus: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ticket_min: Option<f64>,
    #[serde(default)]
    pub ticket_max: Option<f64>,
    #[serde(default)]
    pub is_warm_lead: bool,
    #[serde(default)]
    pub source: Option<String>,
}

impl Investor {
    /// Create a record carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            website: None,
            linkedin_url: None,
            investor_type: None,
            industry_focus: None,
            location: None,
            ticket_min: None,
            ticket_max: None,
            is_warm_lead: false,
            source: None,
        }
    }
}

// ============= Parsed Query =============

/// Investment ticket size range in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketSize {
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl TicketSize {
    /// True when at least one bound is present. A bound of zero still counts.
    pub fn is_bounded(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some()
    }
}

/// Structured criteria extracted from a natural language request.
///
/// Every field is optional; `None` means "no constraint", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ticket_size: Option<TicketSize>,
    #[serde(default)]
    pub company_stage: Option<String>,
    #[serde(default)]
    pub source_project: Option<String>,
    #[serde(default)]
    pub new_project: Option<String>,
    #[serde(default)]
    pub investor_type: Option<String>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub portfolio_focus: Option<String>,
    #[serde(default)]
    pub exit_strategy: Option<String>,
    /// Interpreter diagnostics, kept as an untyped bag.
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ParsedQuery {
    /// Whether the open-search source has anything to search for.
    pub fn has_search_criteria(&self) -> bool {
        self.industry.is_some() || self.location.is_some() || self.investor_type.is_some()
    }
}

// ============= Artifacts =============

/// Generated email content for client communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
}

/// Proposed meeting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub timezone: Option<String>,
}

// ============= Requests & Responses =============

/// Options controlling which optional steps run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrateOptions {
    pub dry_run: bool,
    pub max_results: usize,
    pub include_email_draft: bool,
    pub include_calendar: bool,
    pub create_project: bool,
}

impl Default for OrchestrateOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            max_results: 50,
            include_email_draft: true,
            include_calendar: true,
            create_project: true,
        }
    }
}

/// A request to run the research workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrateRequest {
    pub query: String,
    #[serde(default)]
    pub options: OrchestrateOptions,
}

impl OrchestrateRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            options: OrchestrateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrchestrateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Artifacts of a successful run. Owned by exactly one [`RunRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrateResult {
    #[serde(default)]
    pub parsed_query: Option<ParsedQuery>,
    #[serde(default)]
    pub investors: Vec<Investor>,
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default)]
    pub email_draft: Option<EmailDraft>,
    #[serde(default)]
    pub availability: Option<Vec<AvailabilitySlot>>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Structured answer to a caller. Never a raw fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrateResponse {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OrchestrateResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

// ============= Run State =============

/// Status of a run or of one of its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named steps of a run, declared in their fixed execution order.
///
/// The derived `Ord` follows declaration order, so a `BTreeMap<Step, _>`
/// iterates (and serializes) in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ParseQuery,
    FetchAirtable,
    FetchApollo,
    MergeFilter,
    ExportCsv,
    Calendar,
    EmailDraft,
    CreateProject,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 8] = [
        Step::ParseQuery,
        Step::FetchAirtable,
        Step::FetchApollo,
        Step::MergeFilter,
        Step::ExportCsv,
        Step::Calendar,
        Step::EmailDraft,
        Step::CreateProject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::ParseQuery => "parse_query",
            Step::FetchAirtable => "fetch_airtable",
            Step::FetchApollo => "fetch_apollo",
            Step::MergeFilter => "merge_filter",
            Step::ExportCsv => "export_csv",
            Step::Calendar => "calendar",
            Step::EmailDraft => "email_draft",
            Step::CreateProject => "create_project",
        }
    }

    /// Best-effort steps that only run when requested.
    pub fn is_optional(self) -> bool {
        matches!(self, Step::Calendar | Step::EmailDraft | Step::CreateProject)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state of one orchestration invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub steps: BTreeMap<Step, RunStatus>,
    #[serde(default)]
    pub result: Option<OrchestrateResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunRecord {
    /// A fresh `pending` run with no steps.
    pub fn new(run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            error_message: None,
            steps: BTreeMap::new(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.status = status;
        self.touch();
    }

    pub fn mark_step(&mut self, step: Step, status: RunStatus) {
        self.steps.insert(step, status);
        self.touch();
    }

    pub fn step_status(&self, step: Step) -> Option<RunStatus> {
        self.steps.get(&step).copied()
    }

    pub fn succeed(&mut self, result: OrchestrateResult) {
        self.result = Some(result);
        self.set_status(RunStatus::Succeeded);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.set_status(RunStatus::Failed);
    }

    /// Caller-facing view of this run.
    pub fn to_response(&self) -> OrchestrateResponse {
        OrchestrateResponse {
            run_id: self.run_id.clone(),
            status: self.status,
            result: self.result.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Interpretation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Step '{step}' timed out after {seconds}s")]
    Timeout { step: String, seconds: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
