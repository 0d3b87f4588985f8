//! Airtable integration
//!
//! Reads warm-lead investors tagged with an existing project and creates new
//! project rows. Credentials come from the environment variables named in
//! [`AirtableConfig`]; without them both operations quietly do nothing.
//!
//! Expected investors-table fields:
//!
//! | Airtable field | Investor field |
//! |----------------|----------------|
//! | `Company Name` / `Name` | `name` |
//! | `URL` | `website` |
//! | `LN` | `linkedin_url` |
//! | `Strategic/Financial` | `investor_type` |
//! | `Industry/ Sector Focus` | `industry_focus` |
//! | `HQ` | `location` |

use super::{InvestorSource, ProjectCreator};
use crate::types::{AppError, Investor, ParsedQuery, Result};
use crate::utils::toml_config::{env_secret, AirtableConfig};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Upper bound on followed `offset` pages for one listing.
const MAX_PAGES: usize = 50;

pub const SOURCE_TAG: &str = "airtable";

/// Client for the internal investor registry.
pub struct AirtableClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_id: Option<String>,
    api_base: String,
    investors_table: String,
    projects_table: String,
    project_field: String,
}

impl AirtableClient {
    pub fn new(http: reqwest::Client, config: &AirtableConfig) -> Self {
        Self {
            http,
            api_key: env_secret(&config.api_key_env),
            base_id: env_secret(&config.base_id_env),
            api_base: config.api_base.clone(),
            investors_table: config.investors_table.clone(),
            projects_table: config.projects_table.clone(),
            project_field: config.project_field.clone(),
        }
    }

    /// Override credentials (tests, embedding).
    pub fn with_credentials(mut self, api_key: impl Into<String>, base_id: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.base_id = Some(base_id.into());
        self
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.api_key.as_deref()?, self.base_id.as_deref()?))
    }

    fn table_url(&self, base_id: &str, table: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| AppError::Configuration(format!("invalid Airtable api_base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Airtable api_base cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(base_id)
            .push(table);
        Ok(url)
    }

    /// All investors whose project field equals `project`, across pages.
    pub async fn investors_for_project(&self, project: &str) -> Result<Vec<Investor>> {
        let (api_key, base_id) = self
            .credentials()
            .ok_or_else(|| AppError::Configuration("Airtable credentials are not set".to_string()))?;
        let url = self.table_url(base_id, &self.investors_table)?;
        let formula = format!("{{{}}} = '{}'", self.project_field, escape_formula(project));

        let mut investors = Vec::new();
        let mut offset: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(api_key)
                .query(&[("filterByFormula", formula.as_str())]);
            if let Some(ref offset) = offset {
                request = request.query(&[("offset", offset.as_str())]);
            }

            let page: Value = request.send().await?.error_for_status()?.json().await?;
            if let Some(records) = page["records"].as_array() {
                investors.extend(records.iter().filter_map(investor_from_record));
            }

            offset = page["offset"].as_str().map(str::to_string);
            if offset.is_none() {
                break;
            }
        }

        Ok(investors)
    }

    /// Create a project row and return its record id.
    pub async fn create_project_record(&self, name: &str, investor_count: usize) -> Result<String> {
        let (api_key, base_id) = self
            .credentials()
            .ok_or_else(|| AppError::Configuration("Airtable credentials are not set".to_string()))?;
        let url = self.table_url(base_id, &self.projects_table)?;

        let record: Value = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&json!({
                "fields": {
                    "Name": name,
                    "InvestorCount": investor_count,
                }
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        record["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Http("Airtable create response has no record id".to_string()))
    }
}

#[async_trait]
impl InvestorSource for AirtableClient {
    fn name(&self) -> &str {
        SOURCE_TAG
    }

    /// The registry is not capped by `max_results`: every tagged row is a warm lead.
    async fn fetch(&self, query: &ParsedQuery, _max_results: usize) -> Vec<Investor> {
        let Some(project) = query.source_project.as_deref() else {
            return Vec::new();
        };
        if self.credentials().is_none() {
            debug!("Airtable credentials missing, skipping registry lookup");
            return Vec::new();
        }

        match self.investors_for_project(project).await {
            Ok(investors) => investors,
            Err(e) => {
                warn!(project, error = %e, "Airtable lookup failed, continuing without registry data");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProjectCreator for AirtableClient {
    async fn create_project(&self, name: &str, investors: &[Investor]) -> Option<String> {
        if self.credentials().is_none() {
            debug!("Airtable credentials missing, not creating project");
            return None;
        }

        match self.create_project_record(name, investors.len()).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(project = name, error = %e, "Airtable project creation failed");
                None
            }
        }
    }
}

/// Map one Airtable record to an investor. Rows without a name are skipped.
pub fn investor_from_record(record: &Value) -> Option<Investor> {
    let fields = record.get("fields")?;
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = text("Company Name").or_else(|| text("Name"))?;

    Some(Investor {
        id: record.get("id").and_then(Value::as_str).map(str::to_string),
        name,
        website: text("URL"),
        linkedin_url: text("LN"),
        investor_type: text("Strategic/Financial"),
        industry_focus: text("Industry/ Sector Focus"),
        location: text("HQ"),
        ticket_min: None,
        ticket_max: None,
        is_warm_lead: true,
        source: Some(SOURCE_TAG.to_string()),
    })
}

fn escape_formula(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
