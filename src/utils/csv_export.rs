//! CSV export of investor lists
//!
//! Each export is a new timestamped file in the exports directory, written
//! with [`write_atomic`] so a crash never leaves a truncated CSV behind.

use crate::services::Exporter;
use crate::types::{AppError, Investor, Result};
use crate::utils::fs::write_atomic;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Column order of every export.
pub const HEADER: [&str; 11] = [
    "id",
    "name",
    "website",
    "linkedin_url",
    "investor_type",
    "industry_focus",
    "location",
    "ticket_min",
    "ticket_max",
    "is_warm_lead",
    "source",
];

#[derive(Serialize)]
struct Row<'a> {
    id: Option<&'a str>,
    name: &'a str,
    website: Option<&'a str>,
    linkedin_url: Option<&'a str>,
    investor_type: Option<&'a str>,
    industry_focus: Option<&'a str>,
    location: Option<&'a str>,
    ticket_min: Option<f64>,
    ticket_max: Option<f64>,
    is_warm_lead: bool,
    source: Option<&'a str>,
}

impl<'a> From<&'a Investor> for Row<'a> {
    fn from(investor: &'a Investor) -> Self {
        Self {
            id: investor.id.as_deref(),
            name: &investor.name,
            website: investor.website.as_deref(),
            linkedin_url: investor.linkedin_url.as_deref(),
            investor_type: investor.investor_type.as_deref(),
            industry_focus: investor.industry_focus.as_deref(),
            location: investor.location.as_deref(),
            ticket_min: investor.ticket_min,
            ticket_max: investor.ticket_max,
            is_warm_lead: investor.is_warm_lead,
            source: investor.source.as_deref(),
        }
    }
}

/// Render investors as CSV bytes, header included.
pub fn render_csv(investors: &[Investor]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let to_artifact = |e: csv::Error| AppError::Artifact(format!("CSV encoding failed: {}", e));
    writer.write_record(HEADER).map_err(to_artifact)?;
    for investor in investors {
        writer.serialize(Row::from(investor)).map_err(to_artifact)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Artifact(format!("CSV encoding failed: {}", e)))
}

pub struct CsvExporter {
    directory: PathBuf,
}

impl CsvExporter {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn next_file_name() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "investors_{}_{}.csv",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            &suffix[..8]
        )
    }
}

#[async_trait]
impl Exporter for CsvExporter {
    async fn export(&self, investors: &[Investor]) -> Result<String> {
        let bytes = render_csv(investors)?;
        let path = self.directory.join(Self::next_file_name());

        write_atomic(&path, &bytes).await.map_err(|e| {
            AppError::Artifact(format!("failed to write {}: {}", path.display(), e))
        })?;

        let absolute = tokio::fs::canonicalize(&path).await.map_err(|e| {
            AppError::Artifact(format!("failed to resolve {}: {}", path.display(), e))
        })?;

        Ok(absolute.to_string_lossy().into_owned())
    }
}
