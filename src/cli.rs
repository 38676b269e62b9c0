use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use cleanroom::config::{EngineConfig, HaltPolicy};
use cleanroom::pipeline::{ActionRegistry, Orchestrator, PipelinePreview, PipelineSpec};
use polars::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "cleanroom",
    version,
    about = "Run declarative data-cleaning pipelines"
)]
pub struct Cli {
    /// Engine config file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a pipeline to a CSV file and report the result
    Run {
        /// CSV file to clean
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline JSON: a document with `steps` or a bare step list
        #[arg(short, long)]
        steps: PathBuf,

        /// Skip failed steps instead of halting
        #[arg(long)]
        lenient: bool,

        /// Number of rows in the preview. Defaults to the configured limit.
        #[arg(long)]
        preview: Option<usize>,

        /// Write the preview JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print diagnostics for a CSV file
    Diagnose {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List the available cleaning actions
    Actions {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };

    match cli.command {
        Commands::Run {
            input,
            steps,
            lenient,
            preview,
            output,
        } => handle_run(config, &input, &steps, lenient, preview, output.as_deref()),
        Commands::Diagnose { input } => handle_diagnose(config, &input),
        Commands::Actions { json } => handle_actions(json),
    }
}

fn handle_run(
    mut config: EngineConfig,
    input: &Path,
    steps: &Path,
    lenient: bool,
    preview: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    if lenient {
        config.halt_policy = HaltPolicy::Lenient;
    }
    let limit = preview.unwrap_or(config.preview_row_limit);

    let spec = PipelineSpec::from_file(steps)?;
    let df = load_csv(input)?;
    println!(
        "Running {} step(s) on {} ({} rows)...",
        spec.steps.len(),
        input.display(),
        df.height()
    );

    let outcome = Orchestrator::new(config)
        .execute(&df, &spec.steps)
        .context("Pipeline could not run")?;
    let report = PipelinePreview::build(&outcome, limit).to_json()?;

    for receipt in &outcome.receipts {
        let mark = if receipt.success { "ok  " } else { "FAIL" };
        println!(
            "  [{mark}] #{} {}: {}",
            receipt.step_index, receipt.action, receipt.message
        );
    }

    match output {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Preview written to {}", path.display());
        }
        None => println!("{report}"),
    }

    println!("{}", outcome.summary());
    if let Some(failed) = outcome.failed_step() {
        anyhow::bail!("Pipeline halted at step {}: {}", failed.step_index, failed.message);
    }
    Ok(())
}

fn handle_diagnose(config: EngineConfig, input: &Path) -> Result<()> {
    let df = load_csv(input)?;
    let outcome = Orchestrator::new(config)
        .execute(&df, &[])
        .context("Dataset could not be profiled")?;
    let json = serde_json::to_string_pretty(&outcome.diagnostics)
        .context("Failed to serialize diagnostics")?;
    println!("{json}");
    Ok(())
}

fn handle_actions(json: bool) -> Result<()> {
    let actions = ActionRegistry::global().list();
    if json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
        return Ok(());
    }

    for info in actions {
        println!("{:<34} {}", info.id, info.description);
    }
    Ok(())
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_has_header(true)
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read CSV {}", path.display()))
}
