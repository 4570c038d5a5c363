//! @ai:module:intent CLI for re-scoring logged evaluation samples
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evalscore::{
    registry,
    report::{JsonReporter, JsonReporterTrait, ReportGenerator, ResultsBuilder, ScoreLog},
    ComponentKind, RescoreConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "evalscore")]
#[command(about = "Compute evaluation metrics over logged per-sample scores")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply configured metrics to logged scores
    Score {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the scores JSON file (a list of {scorer, samples})
        #[arg(short, long)]
        scores: PathBuf,

        /// Output directory for reports; prints JSON to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate reports from an existing results file
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// List registered metrics and scorers
    List,

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "rescore.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("evalscore=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            config,
            scores,
            output,
        } => score(config, scores, output),
        Commands::Report { results, output } => generate_reports(results, output),
        Commands::List => list_components(),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Re-score logged samples and write or print the results
/// @ai:effects fs:read, fs:write
fn score(config_path: Option<PathBuf>, scores_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let logs = load_scores(&scores_path)?;
    tracing::info!(
        "Loaded {} scorer logs from {}",
        logs.len(),
        scores_path.display()
    );

    let mut builder = ResultsBuilder::new();
    builder.add_logs(&config, registry(), &logs);
    let results = builder.build();

    match output {
        Some(dir) => {
            ReportGenerator::new().generate_all(&results, &dir)?;
            println!("Results written to {}", dir.display());
        }
        None => println!("{}", JsonReporter::new().render(&results)?),
    }

    if !results.failures.is_empty() {
        tracing::warn!("{} scorers failed to resolve", results.failures.len());
    }
    Ok(())
}

/// @ai:intent Regenerate reports from a results JSON file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let results = JsonReporter::new()
        .load(&results_path)
        .with_context(|| format!("Failed to read results from {}", results_path.display()))?;

    ReportGenerator::new().generate_all(&results, &output_dir)?;

    println!("Reports generated in {}", output_dir.display());
    Ok(())
}

/// @ai:intent Print every registered component
/// @ai:effects state:read
fn list_components() -> Result<()> {
    for kind in [ComponentKind::Metric, ComponentKind::Scorer] {
        let components = registry().list(kind);
        println!("Registered {}s ({}):", kind, components.len());
        for info in &components {
            println!("  {}", info.name);
        }
        println!();
    }
    Ok(())
}

/// @ai:intent Write the default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = RescoreConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<RescoreConfig> {
    match path {
        Some(p) => RescoreConfig::load(&p)
            .with_context(|| format!("Failed to load configuration from {}", p.display())),
        None => {
            let default_path = PathBuf::from("rescore.toml");

            if default_path.exists() {
                RescoreConfig::load(&default_path).with_context(|| {
                    format!("Failed to load configuration from {}", default_path.display())
                })
            } else {
                tracing::info!("No configuration found, using defaults");
                Ok(RescoreConfig::default())
            }
        }
    }
}

/// @ai:effects fs:read
fn load_scores(path: &Path) -> Result<Vec<ScoreLog>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scores from {}", path.display()))?;
    let logs = serde_json::from_str(&content)
        .with_context(|| format!("Invalid scores file {}", path.display()))?;
    Ok(logs)
}
