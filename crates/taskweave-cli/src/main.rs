//! CLI entry point for taskweave.
//!
//! This binary provides the `taskweave` command: `run` executes an NLU
//! response through the orchestrator, `intents` lists what is registered.
//! The process exits non-zero only when the input, configuration or
//! sub-task list itself is unusable; a run whose sub-tasks all failed still
//! prints its report and exits 0.

mod cli;
mod render;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use taskweave_adapters::register_default_skills;
use taskweave_agent::{NluRequest, Orchestrator, TaskweaveConfig, parse_nlu_response};
use taskweave_kernel::HandlerRegistry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load `.env` before anything reads the environment.
    let _ = dotenvy::dotenv();

    let config_missing = !cli.config.exists();
    let config = load_config(&cli.config)?;
    init_tracing(&config.log_level, cli.json_logs);
    if config_missing {
        warn!(path = %cli.config.display(), "configuration file does not exist, using defaults");
    }

    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Commands::Run {
            input,
            user_id,
            json,
        } => cmd_run(&orchestrator, &input, &user_id, json).await,
        Commands::Intents => {
            print!(
                "{}",
                render::intents(orchestrator.registry(), orchestrator.criticality())
            );
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<TaskweaveConfig> {
    let mut config = TaskweaveConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config
        .apply_env_overrides()
        .context("invalid TASKWEAVE_* environment override")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_orchestrator(config: &TaskweaveConfig) -> Result<Orchestrator> {
    let registry = register_default_skills(HandlerRegistry::builder(), config)
        .context("failed to register skills")?
        .build();
    info!(intents = registry.len(), "skills registered");
    Ok(Orchestrator::new(Arc::new(registry), config.criticality()))
}

// ---------------------------------------------------------------------------
// Subcommand: run
// ---------------------------------------------------------------------------

async fn cmd_run(orchestrator: &Orchestrator, input: &str, user_id: &str, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let request = parse_nlu_response(&text).context("failed to parse NLU response")?;

    match request {
        NluRequest::Complex {
            original_query,
            sub_tasks,
        } => {
            let report = orchestrator
                .run(&original_query, sub_tasks, user_id)
                .await
                .context("orchestration rejected the sub-task list")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::report(&report));
            }
        }
        NluRequest::Single(item) => {
            let result = orchestrator
                .run_sequential(vec![item], user_id)
                .await
                .context("orchestration rejected the request")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render::sequential(&result));
            }
        }
        NluRequest::Clarification { question } => {
            println!("{question}");
        }
        NluRequest::Unrecognized => {
            println!("Sorry, that request could not be understood.");
        }
    }
    Ok(())
}

/// Read the NLU document from a file, or stdin for `-`.
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"intent": null}}"#).unwrap();
        let text = read_input(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, r#"{"intent": null}"#);
    }

    #[test]
    fn read_input_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(read_input(missing.to_str().unwrap()).is_err());
    }

    #[test]
    fn config_file_errors_carry_context() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[retry]\nmax_attempts = 0\n").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("max_attempts"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.retry, TaskweaveConfig::default().retry);
    }

    #[test]
    fn default_orchestrator_registers_builtin_skills() {
        let orchestrator = build_orchestrator(&TaskweaveConfig::default()).unwrap();
        assert_eq!(orchestrator.registry().intents(), vec!["SearchWeb", "SendWebhook"]);
    }
}
