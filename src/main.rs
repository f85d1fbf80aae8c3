use std::io::{self, Write};

use anyhow::{Context, Result};
use auction_ops::console::Interactive;
use auction_ops::maintenance::{classify, report, run_purge, run_reset_rounds};
use auction_ops::{connect, init_tracing, load_dotenv, Config, MaintenanceError};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "auction-ops")]
#[command(about = "Maintenance commands for the auction database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify bids on inactive rounds into winning and losing (read-only)
    Analyze(AnalyzeArgs),
    /// Delete losing bids from inactive rounds after confirmation
    Purge,
    /// Empty the round table and restart its identifiers at 1
    ResetRounds,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env().map_err(MaintenanceError::from)?;
    let db = connect(&config)
        .await
        .context("Failed to connect to database")?;

    let mut stdout = io::stdout();
    let result = match cli.command {
        Commands::Analyze(args) => analyze(&db, args.format, &mut stdout).await,
        Commands::Purge => {
            let mut console = Interactive::stdio();
            run_purge(&db, &mut console, &mut stdout).await.map(|outcome| {
                info!(?outcome, "Purge finished");
            })
        }
        Commands::ResetRounds => {
            let mut console = Interactive::stdio();
            run_reset_rounds(&db, &mut console, &mut stdout)
                .await
                .map(|outcome| {
                    info!(?outcome, "Round reset finished");
                })
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "Maintenance command failed");
    }
    result?;

    Ok(())
}

async fn analyze<W: Write>(
    db: &sea_orm::DatabaseConnection,
    format: ReportFormat,
    out: &mut W,
) -> Result<(), MaintenanceError> {
    let classification = classify(db).await?;

    match format {
        ReportFormat::Text => {
            write!(out, "{}", report::render_classification(&classification))?;
        }
        ReportFormat::Json => {
            let json = report::render_json(&classification).map_err(io::Error::from)?;
            writeln!(out, "{json}")?;
        }
    }
    out.flush()?;

    Ok(())
}
