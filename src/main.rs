//! Batch driver: score a sector, fetch social scores, or merge weight files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use esg_news_sentiment::config::{self, PipelineConfig};
use esg_news_sentiment::provider::{DataProxyProvider, FixtureProvider, MarketDataProvider};
use esg_news_sentiment::{
    fetch_social_scores, generate_aggregate_csv_in, run_sector, MergeOutcome, SentimentAnalyzer,
};

#[derive(Parser, Debug)]
#[command(name = "esg-news-sentiment", version, about)]
struct Cli {
    /// Pipeline config (TOML); defaults to $ESG_PIPELINE_CONFIG or config/pipeline.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve provider calls from a JSON fixture instead of the data proxy
    #[arg(long)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every company of a sector and write its weights file
    Sector {
        sector: String,
        #[arg(required = true)]
        companies: Vec<String>,
    },
    /// Fetch ESG social pillar scores
    Social {
        #[arg(required = true)]
        companies: Vec<String>,
        /// Write the table here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge all Weights_<sector>_companies.csv into one file
    Merge {
        output: PathBuf,
        /// Directory to scan; defaults to the configured output dir
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn build_provider(cli: &Cli, cfg: &PipelineConfig) -> Result<Box<dyn MarketDataProvider>> {
    Ok(match &cli.fixture {
        Some(p) => Box::new(FixtureProvider::from_path(p)?),
        None => Box::new(DataProxyProvider::from_config(&cfg.provider)?),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(p) => config::load_from(p)?,
        None => config::load_default()?,
    };

    match &cli.command {
        Command::Sector { sector, companies } => {
            let provider = build_provider(&cli, &cfg)?;
            let analyzer = SentimentAnalyzer::new();
            let run = run_sector(
                provider.as_ref(),
                &analyzer,
                sector,
                companies,
                &cfg.headlines,
            )
            .await?;
            let path = run.write_weights(&cfg.output.dir)?;
            println!(
                "{}: {} companies, {} story errors",
                path.display(),
                run.weights.len(),
                run.errors.len()
            );
        }
        Command::Social { companies, out } => {
            let provider = build_provider(&cli, &cfg)?;
            let scores = fetch_social_scores(provider.as_ref(), companies, &cfg.social).await?;
            match out {
                Some(p) => scores.table.to_writer(std::fs::File::create(p)?)?,
                None => scores.table.to_writer(std::io::stdout())?,
            }
            for e in &scores.errors {
                eprintln!("field error {} (row {:?}, col {:?}): {}", e.code, e.row, e.col, e.message);
            }
        }
        Command::Merge { output, dir } => {
            let dir = dir.clone().unwrap_or_else(|| cfg.output.dir.clone());
            match generate_aggregate_csv_in(&dir, output)? {
                MergeOutcome::NoInputs => println!("No CSV files found in the specified folder."),
                MergeOutcome::Written { .. } => {
                    println!("Aggregate CSV file generated: {}", output.display())
                }
            }
        }
    }
    Ok(())
}
