//! CompFrame CLI
//!
//! Reads an intake questionnaire JSON file and runs the generation
//! pipeline against the Anthropic backend, printing the merged document.

use anyhow::Context;
use clap::{Parser, Subcommand};
use compframe_genai::{AnthropicClient, ClientConfig};
use compframe_pipeline::{LoggingStatusSink, NoopPlanStore, PipelineConfig, PlanPipeline};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "compframe", about = "Compensation plan generation pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a compensation plan document from an intake file
    Generate {
        /// Path to the intake questionnaire JSON
        intake: PathBuf,

        /// Plan id used for status reporting; defaults to a fresh UUID
        #[arg(long)]
        plan_id: Option<String>,

        /// Override the primary generation model
        #[arg(long)]
        model: Option<String>,

        /// Write the merged document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            intake,
            plan_id,
            model,
            output,
        } => generate(intake, plan_id, model, output).await,
    }
}

async fn generate(
    intake_path: PathBuf,
    plan_id: Option<String>,
    model: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&intake_path)
        .with_context(|| format!("reading intake file {}", intake_path.display()))?;
    let intake: Value = serde_json::from_str(&raw).context("parsing intake JSON")?;

    let client_config = ClientConfig::from_env()?;
    let service = Arc::new(AnthropicClient::new(client_config)?);

    let mut pipeline_config = PipelineConfig::default();
    if let Some(model) = model {
        pipeline_config = pipeline_config.with_primary_model(model);
    }

    let pipeline = PlanPipeline::new(service, Arc::new(LoggingStatusSink), Arc::new(NoopPlanStore))
        .with_config(pipeline_config);

    let plan_id = plan_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let document = pipeline.run(&plan_id, &intake).await?;

    let rendered = serde_json::to_string_pretty(&document)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("writing document to {}", path.display()))?;
            tracing::info!(path = %path.display(), "document written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
