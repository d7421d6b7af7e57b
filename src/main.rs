use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docjob::cli::{Cli, Command};
use docjob::ui::JobProgress;
use docjob::{DocjobConfig, JobId, OrchestrationState, Orchestrator, SubmissionError};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "docjob=debug" } else { "docjob=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => DocjobConfig::load_from(path)?,
        None => DocjobConfig::load()?,
    };
    let schedule = config.schedule();
    let max_attempts = schedule.max_attempts;
    let orchestrator = Orchestrator::new(config.client()?, schedule);
    let mut transitions = orchestrator.transitions();

    // Read stdin before the spinner starts drawing over the terminal.
    let input = submission_input(&cli.command)?;
    let progress = JobProgress::start(max_attempts);

    match (cli.command, input) {
        (Command::Watch { job_id }, _) => {
            orchestrator.watch(JobId::new(job_id));
        }
        (Command::Submit { .. }, raw) => {
            match orchestrator.submit(raw.as_deref().unwrap_or_default()).await {
                Ok(job_id) => tracing::debug!(job_id = %job_id, "submission accepted"),
                Err(SubmissionError::EmptyInput) => {
                    progress.finish(&OrchestrationState::Idle);
                    eprintln!("{}", SubmissionError::EmptyInput);
                    return Ok(ExitCode::FAILURE);
                }
                // Recorded as the run's terminal state; rendered below.
                Err(_) => {}
            }
        }
    }

    loop {
        match transitions.recv().await {
            Ok(snapshot) => {
                progress.render(&snapshot.state);
                if !snapshot.state.is_active() {
                    break;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }

    let settled = orchestrator.settled().await;
    progress.finish(&settled.state);
    if cli.report {
        if let Some(report) = orchestrator.report() {
            progress.print_report(&report);
        }
    }

    Ok(exit_code(&settled.state))
}

/// References for `submit`; `watch` reads nothing.
fn submission_input(command: &Command) -> Result<Option<String>> {
    match command {
        Command::Submit { file } => read_input(file.as_deref()).map(Some),
        Command::Watch { .. } => Ok(None),
    }
}

/// Read multi-line references from `path`, or from stdin when absent.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read references from stdin")?;
            Ok(raw)
        }
    }
}

fn exit_code(state: &OrchestrationState) -> ExitCode {
    match state {
        OrchestrationState::Completed { .. } => ExitCode::SUCCESS,
        OrchestrationState::Failed(failure) if failure.is_still_pending() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
