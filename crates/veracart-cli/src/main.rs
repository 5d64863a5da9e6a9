//! Command line front end for the validation pipeline.
//!
//! Thin by design: reads a batch of raw backend items as JSON, runs the
//! pipeline, and prints the search report. All decision logic lives in
//! `veracart-pipeline`.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veracart_core::RawItem;
use veracart_pipeline::ValidationPipeline;

#[derive(Debug, Parser)]
#[command(name = "veracart-cli")]
#[command(about = "Validates, deduplicates, and ranks shopping search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a batch of raw backend results against a search query
    Validate {
        /// The original search query the results were fetched for
        query: String,

        /// Path to a JSON array of raw backend items; reads stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Load and validate the rules file, then exit
    CheckRules,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = veracart_core::load_app_config_from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::debug!(?config, "loaded configuration");

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            query,
            input,
            compact,
        } => {
            let raw_items = read_raw_items(input.as_deref())?;
            let rules = Arc::new(veracart_core::load_rules(&config.rules_path)?);
            let pipeline = ValidationPipeline::new(&config, rules)?;

            let report = pipeline.run(&query, &raw_items).await?;

            let rendered = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{rendered}");
        }
        Commands::CheckRules => {
            let rules = veracart_core::load_rules(&config.rules_path)?;
            println!(
                "rules OK: {} blacklisted domains, {} whitelisted, {} product patterns, {} fallback entries",
                rules.blacklist().len(),
                rules.whitelist().len(),
                rules.product_patterns().len(),
                rules.fallback().len()
            );
        }
    }

    Ok(())
}

/// Reads the raw item batch from a file, or stdin when no path is given.
fn read_raw_items(path: Option<&std::path::Path>) -> anyhow::Result<Vec<RawItem>> {
    let content = match path {
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| anyhow::anyhow!("failed to read input file {}: {e}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let items: Vec<RawItem> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("input is not a JSON array of result objects: {e}"))?;
    Ok(items)
}
