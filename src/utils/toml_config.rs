//! TOML-based configuration for Jockey
//!
//! Configuration lives in `jockey.toml`. Every section has defaults, so a
//! missing file or a partial file yields a working setup. Secrets are never
//! written into the file: sections name the environment variable holding
//! them (`api_key_env`), and `.env` is loaded with `dotenvy` at startup.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [storage]
//! backend = "file"
//! runs_dir = "./runs"
//! exports_dir = "./exports"
//!
//! [orchestration]
//! step_timeout_secs = 60
//! optional_step_failure = "fail_run"
//!
//! [apollo]
//! enable_mock = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from jockey.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JockeyConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub airtable: AirtableConfig,

    #[serde(default)]
    pub apollo: ApolloConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// ============= Storage Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per run under `runs_dir`
    #[default]
    File,
    /// Process-local map, lost on exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub runs_dir: PathBuf,
    pub exports_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            runs_dir: PathBuf::from("./runs"),
            exports_dir: PathBuf::from("./exports"),
        }
    }
}

// ============= Orchestration Configuration =============

/// What a failure in `calendar`, `email_draft` or `create_project` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalStepPolicy {
    /// The run fails, like any other step.
    #[default]
    FailRun,
    /// The step is marked failed, its artifact stays empty, the run goes on.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Upper bound for every collaborator call
    pub step_timeout_secs: u64,
    pub optional_step_failure: OptionalStepPolicy,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: 60,
            optional_step_failure: OptionalStepPolicy::FailRun,
        }
    }
}

impl OrchestrationConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

// ============= Integration Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Environment variable containing the API key
    pub api_key_env: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirtableConfig {
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Environment variable containing the base id
    pub base_id_env: String,
    pub api_base: String,
    pub investors_table: String,
    pub projects_table: String,
    /// Investors-table field holding the project tag
    pub project_field: String,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_key_env: "AIRTABLE_API_KEY".to_string(),
            base_id_env: "AIRTABLE_BASE_ID".to_string(),
            api_base: "https://api.airtable.com/v0".to_string(),
            investors_table: "Investors".to_string(),
            projects_table: "Projects".to_string(),
            project_field: "Project Tag".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApolloConfig {
    /// Environment variable containing the API key
    pub api_key_env: String,
    pub api_base: String,
    /// Overrides `<api_base>/organizations/search`
    pub org_search_url: Option<String>,
    /// Generate deterministic sample firms instead of calling the API
    pub enable_mock: bool,
    /// Upper bound for `per_page` in live searches
    pub per_page_cap: usize,
}

impl Default for ApolloConfig {
    fn default() -> Self {
        Self {
            api_key_env: "APOLLO_API_KEY".to_string(),
            api_base: "https://api.apollo.io/v1".to_string(),
            org_search_url: None,
            enable_mock: false,
            per_page_cap: 25,
        }
    }
}

impl ApolloConfig {
    pub fn search_url(&self) -> String {
        self.org_search_url.clone().unwrap_or_else(|| {
            format!("{}/organizations/search", self.api_base.trim_end_matches('/'))
        })
    }

    /// Mock mode is on when configured or when `APOLLO_ENABLE_MOCK` is truthy.
    pub fn mock_enabled(&self) -> bool {
        self.enable_mock
            || matches!(
                std::env::var("APOLLO_ENABLE_MOCK").as_deref(),
                Ok("1") | Ok("true") | Ok("True")
            )
    }
}

/// Longest accepted meeting slot: one day.
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// UTC hours of tomorrow at which slots start
    pub slot_hours: Vec<u32>,
    pub slot_minutes: i64,
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            slot_hours: vec![9, 13, 17],
            slot_minutes: 30,
            timezone: "UTC".to_string(),
        }
    }
}

/// Read a secret from the environment variable named by a config field.
pub fn env_secret(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl JockeyConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: JockeyConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestration.step_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "orchestration.step_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::File
            && self.storage.runs_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "storage.runs_dir must not be empty".to_string(),
            ));
        }

        if self.storage.exports_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.exports_dir must not be empty".to_string(),
            ));
        }

        if self.apollo.per_page_cap == 0 {
            return Err(ConfigError::ValidationError(
                "apollo.per_page_cap must be greater than zero".to_string(),
            ));
        }

        if self.calendar.slot_hours.is_empty() {
            return Err(ConfigError::ValidationError(
                "calendar.slot_hours must list at least one hour".to_string(),
            ));
        }

        if let Some(hour) = self.calendar.slot_hours.iter().find(|h| **h > 23) {
            return Err(ConfigError::ValidationError(format!(
                "calendar.slot_hours contains invalid hour {}",
                hour
            )));
        }

        if !(1..=MAX_SLOT_MINUTES).contains(&self.calendar.slot_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "calendar.slot_minutes must be between 1 and {}",
                MAX_SLOT_MINUTES
            )));
        }

        Ok(())
    }
}
