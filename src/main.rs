use jockey::cli::init::{InitConfig, InitResult};
use jockey::cli::output::Output;
use jockey::cli::{commands, init, orchestrate_options, Cli, Commands};
use jockey::utils::toml_config::{LogFormat, LoggingConfig};
use jockey::{runs, Collaborators, JockeyConfig, OrchestrateRequest, Orchestrator};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(cli, &output).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<bool> {
    let Cli {
        config: config_path,
        verbose,
        command,
        ..
    } = cli;

    // init runs before any configuration exists
    let command = match command {
        Commands::Init { path, force, mock } => {
            let result = init::run(&InitConfig { path, force, mock }, output);
            return Ok(result == InitResult::Success);
        }
        other => other,
    };

    let config = JockeyConfig::load_or_default(&config_path)?;
    init_tracing(&config.logging, verbose);
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    match command {
        Commands::Orchestrate {
            query,
            execute,
            max_results,
            no_email,
            no_calendar,
            no_project,
            json,
        } => {
            let store = runs::open_store(&config.storage).await?;
            let orchestrator = Orchestrator::new(
                Collaborators::from_config(&config),
                store,
                config.orchestration.clone(),
            );
            let request = OrchestrateRequest::new(query).with_options(orchestrate_options(
                execute,
                max_results,
                no_email,
                no_calendar,
                no_project,
            ));
            commands::orchestrate(&orchestrator, request, json, output).await
        }
        Commands::Run { run_id, json } => {
            let store = runs::open_store(&config.storage).await?;
            commands::show_run(store.as_ref(), &run_id, json, output).await
        }
        Commands::Config { validate } => {
            commands::show_config(&config, &config_path, validate, output)?;
            Ok(true)
        }
        Commands::Init { .. } => Ok(true),
    }
}

/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jockey={},warn", default_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
