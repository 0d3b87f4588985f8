//! Subcommand handlers
//!
//! Handlers print through [`Output`] and return whether the command
//! succeeded so `main` can pick the exit code.

use super::output::Output;
use crate::runs::RunStore;
use crate::types::{OrchestrateRequest, OrchestrateResponse, RunStatus};
use crate::utils::toml_config::{env_secret, JockeyConfig};
use crate::workflows::Orchestrator;
use anyhow::Context;
use std::path::Path;

/// Run one request and print the response. Returns `true` on success.
pub async fn orchestrate(
    orchestrator: &Orchestrator,
    request: OrchestrateRequest,
    json: bool,
    output: &Output,
) -> anyhow::Result<bool> {
    let dry_run = request.options.dry_run;
    let response = orchestrator.orchestrate(request).await;
    let succeeded = response.status == RunStatus::Succeeded;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(succeeded);
    }

    print_response(&response, output);

    if !response.run_id.is_empty() {
        if let Some(run) = orchestrator.get_run(&response.run_id).await? {
            output.subheader("Steps");
            output.steps(&run);
        }
    }

    if succeeded && dry_run {
        output.hint("Dry run: pass --execute to create the project in Airtable.");
    }

    Ok(succeeded)
}

fn print_response(response: &OrchestrateResponse, output: &Output) {
    output.header("Run");
    output.kv(
        "run_id",
        if response.run_id.is_empty() {
            "-"
        } else {
            response.run_id.as_str()
        },
    );
    output.kv("status", &output.status_label(response.status));

    if let Some(ref message) = response.error_message {
        output.error(message);
    }

    let Some(ref result) = response.result else {
        return;
    };

    if let Some(ref parsed) = result.parsed_query {
        output.subheader("Criteria");
        let fields = [
            ("industry", parsed.industry.as_deref()),
            ("location", parsed.location.as_deref()),
            ("investor_type", parsed.investor_type.as_deref()),
            ("company_stage", parsed.company_stage.as_deref()),
            ("source_project", parsed.source_project.as_deref()),
            ("new_project", parsed.new_project.as_deref()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                output.kv(key, value);
            }
        }
        if let Some(ticket) = parsed.ticket_size {
            output.kv(
                "ticket_size",
                &format!(
                    "{} - {}",
                    ticket.minimum.map_or("?".to_string(), |v| v.to_string()),
                    ticket.maximum.map_or("?".to_string(), |v| v.to_string())
                ),
            );
        }
    }

    output.subheader(&format!("Investors ({})", result.investors.len()));
    if result.investors.is_empty() {
        output.info("No investors matched.");
    } else {
        output.investors(&result.investors);
    }

    if let Some(ref path) = result.csv_path {
        output.success(&format!("CSV written to {}", path));
    }

    if let Some(ref slots) = result.availability {
        output.subheader("Availability");
        for slot in slots {
            output.list_item(&format!(
                "{} to {}",
                slot.start.format("%Y-%m-%d %H:%M"),
                slot.end.format("%H:%M %Z")
            ));
        }
    }

    if let Some(ref draft) = result.email_draft {
        output.subheader(&format!("Email draft: {}", draft.subject));
        for line in draft.body_text.lines() {
            println!("    {}", line);
        }
    }

    if let Some(ref project_id) = result.project_id {
        output.success(&format!("Project created: {}", project_id));
    }
}

/// Print a persisted run. Returns `false` when it does not exist.
pub async fn show_run(
    store: &dyn RunStore,
    run_id: &str,
    json: bool,
    output: &Output,
) -> anyhow::Result<bool> {
    let Some(run) = store
        .load(run_id)
        .await
        .with_context(|| format!("failed to load run {}", run_id))?
    else {
        output.error(&format!("Run '{}' not found", run_id));
        return Ok(false);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(true);
    }

    print_response(&run.to_response(), output);
    output.subheader("Steps");
    output.steps(&run);
    output.kv("created_at", &run.created_at.to_rfc3339());
    output.kv("updated_at", &run.updated_at.to_rfc3339());

    Ok(true)
}

/// Print or validate the effective configuration.
pub fn show_config(
    config: &JockeyConfig,
    path: &Path,
    validate: bool,
    output: &Output,
) -> anyhow::Result<()> {
    config.validate()?;

    if validate {
        output.success(&format!("{} is valid", path.display()));
        return Ok(());
    }

    output.header("Configuration");
    output.kv(
        "file",
        &if path.exists() {
            path.display().to_string()
        } else {
            format!("{} (not found, using defaults)", path.display())
        },
    );
    output.newline();
    for line in toml::to_string_pretty(config)?.lines() {
        println!("    {}", line);
    }

    output.subheader("Secrets");
    let secrets = [
        config.openai.api_key_env.as_str(),
        config.airtable.api_key_env.as_str(),
        config.airtable.base_id_env.as_str(),
        config.apollo.api_key_env.as_str(),
    ];
    for name in secrets {
        let state = if env_secret(name).is_some() {
            "set"
        } else {
            "missing"
        };
        output.kv(name, state);
    }

    if config.apollo.mock_enabled() || env_secret(&config.apollo.api_key_env).is_none() {
        output.warning("Apollo runs in mock mode");
    }

    Ok(())
}
