//! Claim Auditor CLI
//!
//! Runs the verification pipeline (ingest, extract, verify, analyze)
//! and prints per-stage summaries as JSON.

use ca_pipeline::{analyze, run_pipeline, Settings, Step};
use ca_store::Store;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "claim-audit")]
#[command(about = "Verify executive claims from earnings calls against financial statements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline (all steps by default)
    Run {
        /// Steps to run, comma-separated: ingest,extract,verify,analyze
        #[arg(short, long)]
        steps: Option<String>,

        /// Override target tickers, comma-separated
        #[arg(short, long)]
        tickers: Option<String>,
    },

    /// Fetch profiles, statements, and transcripts
    Ingest {
        /// Override target tickers, comma-separated
        #[arg(short, long)]
        tickers: Option<String>,
    },

    /// Extract claims from stored transcripts
    Extract,

    /// Verify extracted claims against financial data
    Verify,

    /// Detect cross-quarter discrepancy patterns
    Analyze,

    /// Print a company's analysis report
    Report {
        /// Company ticker
        #[arg(short, long)]
        ticker: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = Settings::default();

    let result = match cli.command {
        Commands::Run { steps, tickers } => {
            apply_tickers(&mut settings, tickers);
            let steps = match parse_steps(steps) {
                Ok(steps) => steps,
                Err(message) => {
                    error!("{message}");
                    std::process::exit(2);
                }
            };
            run_and_print(&settings, &steps).await
        }
        Commands::Ingest { tickers } => {
            apply_tickers(&mut settings, tickers);
            run_and_print(&settings, &[Step::Ingest]).await
        }
        Commands::Extract => run_and_print(&settings, &[Step::Extract]).await,
        Commands::Verify => run_and_print(&settings, &[Step::Verify]).await,
        Commands::Analyze => run_and_print(&settings, &[Step::Analyze]).await,
        Commands::Report { ticker } => report(&settings, &ticker).await,
    };

    if let Err(message) = result {
        error!("{message}");
        std::process::exit(1);
    }
}

fn apply_tickers(settings: &mut Settings, tickers: Option<String>) {
    if let Some(raw) = tickers {
        settings.target_tickers = raw
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
    }
}

fn parse_steps(raw: Option<String>) -> Result<Vec<Step>, String> {
    match raw {
        None => Ok(Step::ALL.to_vec()),
        Some(raw) => raw.split(',').map(str::parse).collect(),
    }
}

async fn run_and_print(settings: &Settings, steps: &[Step]) -> Result<(), String> {
    let report = run_pipeline(settings, steps).await.map_err(|e| e.to_string())?;
    let rendered = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{rendered}");
    if !report.ok() {
        return Err("pipeline completed with errors; see warnings above".to_string());
    }
    Ok(())
}

async fn report(settings: &Settings, ticker: &str) -> Result<(), String> {
    let store = Store::open(&settings.database_url).await.map_err(|e| e.to_string())?;
    let company = store
        .companies()
        .get_by_ticker(ticker)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no company stored for ticker '{ticker}'"))?;

    let analysis = analyze::analyze_company(&store, &company)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("{ticker} has no verified claims yet; run the pipeline first"))?;

    let rendered = serde_json::to_string_pretty(&analysis).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}
