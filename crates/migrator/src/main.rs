//! Main entry point for the Bonesquad legacy migrator

use anyhow::Context;
use clap::Parser;
use migrator::backend::SupabaseBackend;
use migrator::orchestrator::rehearsal_backend;
use migrator::snapshot::SnapshotFetcher;
use migrator::{Config, MigrationReport, Migrator};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "bonesquad-migrate",
    about = "Migrate the Bonesquad legacy spreadsheet data into the hosted backend",
    version,
    author
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate example configuration file
    #[arg(long)]
    gen_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run against an in-memory copy of the backend; nothing is written
    #[arg(long)]
    dry_run: bool,

    /// Also write the final report as JSON
    #[arg(long, value_name = "FILE")]
    report_json: Option<PathBuf>,
}

fn init_logging(debug: bool, json: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn migrate(config: &Config, dry_run: bool) -> migrator::Result<MigrationReport> {
    config.validate()?;

    let fetcher = SnapshotFetcher::from_config(&config.snapshot)?;
    let remote = SupabaseBackend::from_config(&config.backend)?;

    if !dry_run {
        return Migrator::new(&remote, config).run(&fetcher).await;
    }

    info!("Dry run: remote state is read once, all writes stay in memory");
    let snapshot = fetcher.fetch().await?;
    let rehearsal = rehearsal_backend(&remote).await?;
    Ok(Migrator::new(&rehearsal, config)
        .dry_run(true)
        .migrate(&snapshot)
        .await)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.debug, args.json_logs);

    // Handle config generation
    if args.gen_config {
        let example_config = Config::generate_example()?;
        println!("{example_config}");
        return Ok(());
    }

    info!("Starting Bonesquad legacy migrator v{}", migrator::VERSION);

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let report = match migrate(&config, args.dry_run).await {
        Ok(report) => report,
        Err(e) => {
            error!(code = e.error_code(), "Migration aborted: {}", e);
            return Err(e.into());
        }
    };

    println!("{report}");

    if let Some(path) = args.report_json {
        report.write_json(&path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
