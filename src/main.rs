//! Feedback reporter - Main Entry Point
//!
//! Multi-command CLI:
//! - `feedback submit` - Submit one error report in a background task
//! - `feedback config` - Print the resolved configuration

use anonymous_feedback::config::{CliArgs, CommandMode, FeedbackConfig};
use anonymous_feedback::task::{BackgroundScheduler, FeedbackSubmissionTask, TokioScheduler};
use anonymous_feedback::{ErrorReport, FeedbackParameters, TaskState};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_parameters(message: Option<String>, fields: Vec<(String, String)>) -> FeedbackParameters {
    let mut params = match message {
        Some(message) => ErrorReport::new(message).into_parameters(),
        None => FeedbackParameters::new(),
    };
    for (key, value) in fields {
        params.insert(key, Some(value));
    }
    params
}

/// Submit one report and wait for the continuation that fires
async fn run_submit(
    config: FeedbackConfig,
    title: String,
    message: Option<String>,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let params = build_parameters(message, fields);
    tracing::info!("Submitting {} fields to {}", params.len(), config.endpoint);

    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
    let tx_failure = tx.clone();

    let task = FeedbackSubmissionTask::new(
        None,
        title,
        true,
        params,
        move |token| {
            if let Some(tx) = tx.lock().ok().and_then(|mut t| t.take()) {
                let _ = tx.send(Ok(token));
            }
        },
        move |err| {
            if let Some(tx) = tx_failure.lock().ok().and_then(|mut t| t.take()) {
                let _ = tx.send(Err(err));
            }
        },
    )
    .with_endpoint(config.endpoint.clone())
    .with_connection_factory(Arc::new(config.to_factory()));

    let handle = TokioScheduler::current().schedule_background(Box::new(task));
    let state = handle.join().await;

    if state == TaskState::Cancelled {
        anyhow::bail!("Submission was cancelled");
    }

    let token = rx
        .await
        .context("Submission finished without reporting a result")?
        .context("Failed to submit feedback")?;

    println!("{}", token);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level);

    let (config, mode) = FeedbackConfig::from_cli(args).context("Failed to load configuration")?;
    tracing::debug!("Resolved configuration: {:?}", config);

    match mode {
        CommandMode::Submit {
            title,
            message,
            fields,
        } => run_submit(config, title, message, fields).await,
        CommandMode::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
