//! Mock collaborators and stores for testing.
//!
//! Each mock records how it was called so tests can assert on which steps
//! actually reached their collaborator.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use jockey::runs::{MemoryRunStore, RunStore};
use jockey::services::{
    AvailabilityProvider, Collaborators, Drafter, Exporter, InvestorSource, ProjectCreator,
    QueryInterpreter,
};
use jockey::types::{
    AppError, AvailabilitySlot, EmailDraft, Investor, ParsedQuery, Result, RunRecord,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Interpreter returning a fixed query, an error, or nothing within a delay.
pub struct MockInterpreter {
    outcome: std::result::Result<ParsedQuery, String>,
    delay: Option<std::time::Duration>,
    pub calls: AtomicUsize,
}

impl MockInterpreter {
    pub fn returning(query: ParsedQuery) -> Self {
        Self {
            outcome: Ok(query),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with an interpretation error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(query: ParsedQuery, delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::returning(query)
        }
    }
}

#[async_trait]
impl QueryInterpreter for MockInterpreter {
    async fn interpret(&self, _query: &str) -> Result<ParsedQuery> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome
            .clone()
            .map_err(AppError::Interpretation)
    }
}

/// Source returning a fixed list and remembering the last `max_results`.
pub struct MockSource {
    name: String,
    investors: Vec<Investor>,
    pub calls: AtomicUsize,
    pub last_max_results: Mutex<Option<usize>>,
}

impl MockSource {
    pub fn new(name: &str, investors: Vec<Investor>) -> Self {
        Self {
            name: name.to_string(),
            investors,
            calls: AtomicUsize::new(0),
            last_max_results: Mutex::new(None),
        }
    }

    pub fn empty(name: &str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvestorSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _query: &ParsedQuery, max_results: usize) -> Vec<Investor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_max_results.lock() = Some(max_results);
        self.investors.clone()
    }
}

/// Exporter that keeps what it was given instead of writing files.
#[derive(Default)]
pub struct MockExporter {
    fail: bool,
    pub exported: Mutex<Vec<Vec<Investor>>>,
}

impl MockExporter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Exporter for MockExporter {
    async fn export(&self, investors: &[Investor]) -> Result<String> {
        if self.fail {
            return Err(AppError::Artifact("disk full".to_string()));
        }
        let mut exported = self.exported.lock();
        exported.push(investors.to_vec());
        Ok(format!("/tmp/exports/investors_{}.csv", exported.len()))
    }
}

pub fn sample_slots() -> Vec<AvailabilitySlot> {
    let start = Utc.with_ymd_and_hms(2030, 1, 2, 9, 0, 0).unwrap();
    vec![AvailabilitySlot {
        start,
        end: start + Duration::minutes(30),
        timezone: Some("UTC".to_string()),
    }]
}

#[derive(Default)]
pub struct MockAvailability {
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockAvailability {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AvailabilityProvider for MockAvailability {
    async fn suggest(&self) -> Result<Vec<AvailabilitySlot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Internal("calendar unavailable".to_string()));
        }
        Ok(sample_slots())
    }
}

/// Drafter recording how many slots (if any) it was handed.
#[derive(Default)]
pub struct MockDrafter {
    fail: bool,
    pub received_slots: Mutex<Vec<Option<usize>>>,
}

impl MockDrafter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Drafter for MockDrafter {
    fn draft(
        &self,
        investors: &[Investor],
        availability: Option<&[AvailabilitySlot]>,
        _query: &ParsedQuery,
    ) -> Result<EmailDraft> {
        self.received_slots.lock().push(availability.map(<[_]>::len));
        if self.fail {
            return Err(AppError::Internal("template error".to_string()));
        }
        Ok(EmailDraft {
            subject: "Investor list".to_string(),
            body_text: format!("{} investors", investors.len()),
            body_html: None,
        })
    }
}

#[derive(Default)]
pub struct MockProjects {
    pub created: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ProjectCreator for MockProjects {
    async fn create_project(&self, name: &str, investors: &[Investor]) -> Option<String> {
        let mut created = self.created.lock();
        created.push((name.to_string(), investors.len()));
        Some(format!("rec{}", created.len()))
    }
}

/// All mocks of one orchestrator, kept so tests can inspect them afterwards.
pub struct MockSet {
    pub interpreter: Arc<MockInterpreter>,
    pub internal: Arc<MockSource>,
    pub external: Arc<MockSource>,
    pub exporter: Arc<MockExporter>,
    pub availability: Arc<MockAvailability>,
    pub drafter: Arc<MockDrafter>,
    pub projects: Arc<MockProjects>,
}

impl MockSet {
    pub fn new(interpreter: MockInterpreter) -> Self {
        Self {
            interpreter: Arc::new(interpreter),
            internal: Arc::new(MockSource::empty("airtable")),
            external: Arc::new(MockSource::empty("apollo")),
            exporter: Arc::new(MockExporter::default()),
            availability: Arc::new(MockAvailability::default()),
            drafter: Arc::new(MockDrafter::default()),
            projects: Arc::new(MockProjects::default()),
        }
    }

    pub fn with_internal(mut self, investors: Vec<Investor>) -> Self {
        self.internal = Arc::new(MockSource::new("airtable", investors));
        self
    }

    pub fn with_external(mut self, investors: Vec<Investor>) -> Self {
        self.external = Arc::new(MockSource::new("apollo", investors));
        self
    }

    pub fn with_exporter(mut self, exporter: MockExporter) -> Self {
        self.exporter = Arc::new(exporter);
        self
    }

    pub fn with_availability(mut self, availability: MockAvailability) -> Self {
        self.availability = Arc::new(availability);
        self
    }

    pub fn with_drafter(mut self, drafter: MockDrafter) -> Self {
        self.drafter = Arc::new(drafter);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            interpreter: self.interpreter.clone(),
            internal_source: self.internal.clone(),
            external_source: self.external.clone(),
            exporter: self.exporter.clone(),
            availability: self.availability.clone(),
            drafter: self.drafter.clone(),
            projects: self.projects.clone(),
        }
    }
}

/// Memory store that keeps every saved version of every run.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryRunStore,
    pub history: Mutex<Vec<RunRecord>>,
}

impl RecordingStore {
    pub fn snapshots(&self) -> Vec<RunRecord> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl RunStore for RecordingStore {
    async fn save(&self, run: &RunRecord) -> Result<()> {
        self.history.lock().push(run.clone());
        self.inner.save(run).await
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        self.inner.load(run_id).await
    }
}

/// Memory store whose saves start failing after a number of successes.
pub struct FailingStore {
    inner: MemoryRunStore,
    successful_saves: usize,
    saves: AtomicUsize,
}

impl FailingStore {
    /// Every save fails, including the one in `create`.
    pub fn always() -> Self {
        Self::after(0)
    }

    pub fn after(successful_saves: usize) -> Self {
        Self {
            inner: MemoryRunStore::new(),
            successful_saves,
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RunStore for FailingStore {
    async fn save(&self, run: &RunRecord) -> Result<()> {
        if self.saves.fetch_add(1, Ordering::SeqCst) >= self.successful_saves {
            return Err(AppError::Persistence("disk unavailable".to_string()));
        }
        self.inner.save(run).await
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        self.inner.load(run_id).await
    }
}

/// Investor with a website and optional ticket bounds.
pub fn investor(name: &str, website: Option<&str>, min: Option<f64>, max: Option<f64>) -> Investor {
    Investor {
        website: website.map(str::to_string),
        ticket_min: min,
        ticket_max: max,
        ..Investor::named(name)
    }
}
