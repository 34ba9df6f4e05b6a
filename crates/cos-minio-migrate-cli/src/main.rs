//! cos-minio-migrate CLI - manifest-driven COS to MinIO object migration.

mod sample;

use clap::{Parser, Subcommand};
use cos_minio_migrate::{
    Config, CosStore, ItemStatus, Manifest, MigrateError, MigrationConfig, MinioStore, Migrator,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "cos-minio-migrate")]
#[command(about = "Manifest-driven COS to MinIO object migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the objects listed in a CSV manifest
    Run {
        /// Path to the CSV manifest
        manifest: PathBuf,

        /// Restrict resolution to one configured source identity
        #[arg(long)]
        source: Option<String>,

        /// Override the scratch download directory
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Override the number of parallel workers
        #[arg(long)]
        workers: Option<usize>,

        /// Re-attempt pending and failed rows only. Rows left in
        /// `processing` by a crash need an explicit --status-filter.
        #[arg(long)]
        resume: bool,

        /// Row statuses to select (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "pending")]
        status_filter: Vec<String>,

        /// Write the updated manifest here instead of rewriting in place
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output JSON result to stdout
        #[arg(long)]
        output_json: bool,
    },

    /// Show per-status row counts for a manifest
    Stats {
        /// Path to the CSV manifest
        manifest: PathBuf,
    },

    /// Write a small example manifest for trying the tool out
    GenManifest {
        /// Output path for the sample manifest
        #[arg(short, long, default_value = "sample_manifest.csv")]
        output: PathBuf,

        /// Include per-row destination bucket overrides
        #[arg(long)]
        with_buckets: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(MigrateError::Config)?;

    match cli.command {
        Commands::GenManifest {
            output,
            with_buckets,
        } => {
            sample::write_sample_manifest(&output, with_buckets)?;
            println!("Sample manifest written to {}", output.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Stats { manifest } => {
            // Stats only needs column names; fall back to defaults when no
            // config file is around.
            let columns = if cli.config.exists() {
                Config::load(&cli.config)?.migration
            } else {
                MigrationConfig::default()
            };
            let manifest = Manifest::load(&manifest, &columns)?;
            let stats = manifest.statistics();

            println!("Manifest statistics:");
            println!("  Total: {}", stats.total);
            println!("  Pending: {}", stats.pending);
            println!("  Processing: {}", stats.processing);
            println!("  Success: {}", stats.success);
            println!("  Failed: {}", stats.failed);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Run {
            manifest,
            source,
            temp_dir,
            workers,
            resume,
            status_filter,
            output,
            output_json,
        } => {
            let mut config = Config::load(&cli.config)?;
            info!("Loaded configuration from {:?}", cli.config);

            // Apply overrides
            if let Some(name) = source {
                config.select_source(&name)?;
            }
            if let Some(w) = workers {
                config.migration.workers = Some(w);
            }
            if let Some(dir) = temp_dir {
                config.migration.temp_dir = Some(dir);
            }
            config.validate()?;

            let statuses = parse_status_filter(&status_filter)?;

            if !manifest.exists() {
                return Err(MigrateError::Config(format!(
                    "manifest not found: {}",
                    manifest.display()
                )));
            }

            let manifest = Arc::new(Manifest::load(&manifest, &config.migration)?);
            let source_store = Arc::new(CosStore::new(config.sources.clone()));
            let sink_store = Arc::new(MinioStore::connect(&config.sink).await?);

            let migrator = Migrator::new(
                manifest,
                source_store,
                sink_store,
                config.migration.get_workers(),
                config.migration.get_temp_dir(),
            );

            let report = migrator.run(&statuses, resume, output.as_deref()).await?;

            if output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", report.run_id);
                println!("  Duration: {:.2}s", report.duration_seconds);
                println!("  Total: {}", report.total);
                println!("  Success: {}", report.success);
                println!("  Skipped: {}", report.skipped);
                println!("  Failed: {}", report.failed);
                println!("  Success rate: {:.2}%", report.success_rate);
            }

            if report.failed == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
    }
}

fn parse_status_filter(raw: &[String]) -> Result<Vec<ItemStatus>, MigrateError> {
    raw.iter().map(|s| s.parse::<ItemStatus>()).collect()
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
