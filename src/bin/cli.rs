//! quakewatch CLI
//!
//! Local execution entry point, meant to be run from cron or a systemd timer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quakewatch::{
    error::Result,
    mail::SmtpMailTransport,
    models::Config,
    pipeline, source,
    storage::{FileWatermarkStore, WatermarkStore},
};

/// quakewatch - KOERI bulletin watcher
#[derive(Parser, Debug)]
#[command(
    name = "quakewatch",
    version,
    about = "Mails new earthquakes from the KOERI bulletin"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "quakewatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the bulletin, advance the watermark and notify on new matches
    Check {
        /// Print the run outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the next check would match without side effects
    DryRun,

    /// Validate the configuration file
    Validate,

    /// Show the stored watermark
    Status,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    let store = FileWatermarkStore::new(&config.tracker.tracker_file);

    match cli.command {
        Command::Check { json } => {
            config.validate()?;
            let source = source::from_config(&config.source)?;
            let transport = SmtpMailTransport::new(&config.mail)?;

            let report =
                pipeline::run_check(&config, source.as_ref(), &store, &transport).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                log::info!("Check finished: {:?}", report.outcome);
            }
        }

        Command::DryRun => {
            let source = source::from_config(&config.source)?;
            let preview = pipeline::run_preview(&config, source.as_ref(), &store).await?;

            match (preview.stored, preview.boundary) {
                (None, _) => log::info!("No stored watermark; filtering whole bulletin"),
                (Some(stored), None) => log::warn!(
                    "Stored watermark {} not in bulletin; filtering whole bulletin",
                    stored
                ),
                (Some(stored), Some(index)) => {
                    log::info!("Stored watermark {} found at index {}", stored, index)
                }
            }
            log::info!(
                "Newest record {}, {} match(es), {} skipped line(s)",
                preview.newest,
                preview.matched.len(),
                preview.skipped_lines
            );
            for record in &preview.matched {
                println!("{}", record.raw);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", cli.config.display());
        }

        Command::Status => {
            log::info!("Tracker file: {}", store.path().display());
            match store.load()? {
                Some(watermark) => {
                    let bulletin = watermark
                        .bulletin_form()
                        .unwrap_or_else(|| "out of range".to_string());
                    println!("{} ({})", watermark.epoch(), bulletin);
                }
                None => log::info!("No watermark stored yet."),
            }
        }
    }

    Ok(())
}
