//! Run state machine
//!
//! Drives one request through the fixed step catalogue, persisting the run
//! after every transition so a poller always sees the latest state.

use crate::pipeline::{apply_ticket_filter, merge_and_dedupe};
use crate::runs::RunStore;
use crate::services::Collaborators;
use crate::types::{
    AppError, Investor, OrchestrateRequest, OrchestrateResponse, OrchestrateResult, Result,
    RunRecord, RunStatus, Step,
};
use crate::utils::toml_config::{OptionalStepPolicy, OrchestrationConfig};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Coordinates collaborators and the run store for each request.
pub struct Orchestrator {
    collaborators: Collaborators,
    store: Arc<dyn RunStore>,
    settings: OrchestrationConfig,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        store: Arc<dyn RunStore>,
        settings: OrchestrationConfig,
    ) -> Self {
        Self {
            collaborators,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Execute the full workflow for `request`.
    ///
    /// Never returns an error: every failure is recorded on the run and
    /// reported as a `failed` response.
    pub async fn orchestrate(&self, request: OrchestrateRequest) -> OrchestrateResponse {
        let mut run = match self.store.create().await {
            Ok(run) => run,
            Err(e) => {
                error!(error = %e, "Failed to create run record");
                return OrchestrateResponse {
                    run_id: String::new(),
                    status: RunStatus::Failed,
                    result: None,
                    error_message: Some(e.to_string()),
                };
            }
        };

        let span = info_span!("orchestrate", run_id = %run.run_id);
        async {
            info!(dry_run = request.options.dry_run, "Run started");

            match self.drive(&mut run, &request).await {
                Ok(result) => {
                    run.succeed(result);
                    if let Err(e) = self.store.save(&run).await {
                        // The terminal save is the last transition; report it as the failure.
                        error!(error = %e, "Failed to persist succeeded run");
                        run.result = None;
                        run.fail(e.to_string());
                        return run.to_response();
                    }
                    info!(
                        investors = run.result.as_ref().map_or(0, |r| r.investors.len()),
                        "Run succeeded"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Run failed");
                    run.fail(e.to_string());
                    if let Err(save_err) = self.store.save(&run).await {
                        error!(error = %save_err, "Failed to persist failed run");
                    }
                }
            }

            run.to_response()
        }
        .instrument(span)
        .await
    }

    /// Load a persisted run for polling.
    pub async fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        self.store.load(run_id).await
    }

    async fn drive(
        &self,
        run: &mut RunRecord,
        request: &OrchestrateRequest,
    ) -> Result<OrchestrateResult> {
        let options = &request.options;
        let c = &self.collaborators;

        run.set_status(RunStatus::Running);
        self.persist(run).await?;

        let mut result = OrchestrateResult::default();

        let parsed = self
            .run_step(run, Step::ParseQuery, c.interpreter.interpret(&request.query))
            .await?;
        result.parsed_query = Some(parsed.clone());

        let internal = self
            .run_step(run, Step::FetchAirtable, async {
                Ok(c.internal_source.fetch(&parsed, options.max_results).await)
            })
            .await?;
        let internal = tag_internal(internal, c.internal_source.name());

        let external = if parsed.has_search_criteria() {
            self.run_step(run, Step::FetchApollo, async {
                Ok(c.external_source.fetch(&parsed, options.max_results).await)
            })
            .await?
        } else {
            info!("No open-search criteria, skipping external fetch");
            run.mark_step(Step::FetchApollo, RunStatus::Succeeded);
            self.persist(run).await?;
            Vec::new()
        };

        let investors = self
            .run_step(run, Step::MergeFilter, async {
                let merged = merge_and_dedupe(&internal, &external);
                Ok(match parsed.ticket_size {
                    Some(bounds) => apply_ticket_filter(merged, &bounds),
                    None => merged,
                })
            })
            .await?;
        info!(
            internal = internal.len(),
            external = external.len(),
            kept = investors.len(),
            "Merged investor lists"
        );

        result.csv_path = Some(
            self.run_step(run, Step::ExportCsv, c.exporter.export(&investors))
                .await?,
        );

        if options.include_calendar {
            result.availability = self
                .optional_step(run, Step::Calendar, c.availability.suggest())
                .await?;
        }

        if options.include_email_draft {
            let slots = result.availability.as_deref();
            result.email_draft = self
                .optional_step(run, Step::EmailDraft, async {
                    c.drafter.draft(&investors, slots, &parsed)
                })
                .await?;
        }

        if options.create_project && !options.dry_run {
            if let Some(ref name) = parsed.new_project {
                result.project_id = self
                    .optional_step(run, Step::CreateProject, async {
                        Ok(c.projects.create_project(name, &investors).await)
                    })
                    .await?
                    .flatten();
            }
        }

        result.investors = investors;
        Ok(result)
    }

    /// Run one step: mark it running, await it under the step timeout, record the outcome.
    ///
    /// On failure the step is marked `failed` in memory only; the caller's
    /// terminal save records it.
    async fn run_step<T, F>(&self, run: &mut RunRecord, step: Step, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.begin_step(run, step).await?;

        match self.timed(step, work).await {
            Ok(value) => {
                self.finish_step(run, step).await?;
                Ok(value)
            }
            Err(e) => {
                run.mark_step(step, RunStatus::Failed);
                warn!(step = %step, error = %e, "Step failed");
                Err(e)
            }
        }
    }

    /// Like [`Self::run_step`], but under [`OptionalStepPolicy::Degrade`] a
    /// collaborator failure of a [`Step::is_optional`] step leaves the artifact
    /// empty instead of failing the run. Store failures stay fatal either way.
    async fn optional_step<T, F>(
        &self,
        run: &mut RunRecord,
        step: Step,
        work: F,
    ) -> Result<Option<T>>
    where
        F: Future<Output = Result<T>>,
    {
        self.begin_step(run, step).await?;

        match self.timed(step, work).await {
            Ok(value) => {
                self.finish_step(run, step).await?;
                Ok(Some(value))
            }
            Err(e) => {
                run.mark_step(step, RunStatus::Failed);
                if step.is_optional()
                    && self.settings.optional_step_failure == OptionalStepPolicy::Degrade
                {
                    warn!(step = %step, error = %e, "Optional step failed, continuing without it");
                    self.persist(run).await?;
                    Ok(None)
                } else {
                    warn!(step = %step, error = %e, "Step failed");
                    Err(e)
                }
            }
        }
    }

    async fn begin_step(&self, run: &mut RunRecord, step: Step) -> Result<()> {
        run.mark_step(step, RunStatus::Running);
        self.persist(run).await
    }

    async fn finish_step(&self, run: &mut RunRecord, step: Step) -> Result<()> {
        run.mark_step(step, RunStatus::Succeeded);
        self.persist(run).await?;
        info!(step = %step, "Step succeeded");
        Ok(())
    }

    /// Await `work`, converting an elapsed step timeout into [`AppError::Timeout`].
    async fn timed<T, F>(&self, step: Step, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.settings.step_timeout(), work)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Timeout {
                    step: step.to_string(),
                    seconds: self.settings.step_timeout_secs,
                })
            })
    }

    async fn persist(&self, run: &RunRecord) -> Result<()> {
        self.store.save(run).await
    }
}

/// Registry records are always warm leads and default their provenance.
fn tag_internal(investors: Vec<Investor>, source_name: &str) -> Vec<Investor> {
    investors
        .into_iter()
        .map(|mut investor| {
            investor.is_warm_lead = true;
            if investor.source.is_none() {
                investor.source = Some(source_name.to_string());
            }
            investor
        })
        .collect()
}
