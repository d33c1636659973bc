//! # Capbox - Main Entry Point
//!
//! Punto di ingresso della CLI.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione della configurazione (ambiente + flag) e avvio dell'optimizer
//! - Exit code: 0 se tutto ok, diverso da zero con l'errore che ha causato il fallimento
//!
//! ## Esempio di utilizzo:
//! ```bash
//! CAPACITOR_PROJECT_ROOT=/path/to/app CAPBOX_PLATFORM=pwa capbox optimize --workers 8
//! capbox android-release --root /path/to/app
//! ```

use anyhow::Result;
use capbox_optimizer::config::{PLATFORM_ENV, PROJECT_ROOT_ENV};
use capbox_optimizer::json_output::JsonMessage;
use capbox_optimizer::platform::PlatformCommands;
use capbox_optimizer::{AndroidBuilder, AssetOptimizer, Config, SystemTool};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capbox")]
#[command(about = "Post-build asset pipeline for Capacitor apps")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Downlevel and minify every JS file of the web build (and compress for pwa)
    Optimize {
        /// Project root containing capacitor.config.json
        #[arg(long, env = PROJECT_ROOT_ENV)]
        root: Option<PathBuf>,

        /// Target platform; only `pwa` produces .gz/.br artifacts
        #[arg(short, long, env = PLATFORM_ENV)]
        platform: Option<String>,

        /// Build directory, overriding webDir from capacitor.config.json
        #[arg(long)]
        web_dir: Option<PathBuf>,

        /// Number of files optimized concurrently (default: CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Abort the run after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Load settings from a JSON config file before applying flags
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit JSON events on stdout
        #[arg(long)]
        json: bool,

        /// Do not draw the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Build the Android release package with the Gradle wrapper
    AndroidRelease {
        /// Project root containing the android/ directory
        #[arg(long, env = PROJECT_ROOT_ENV)]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Running on {}", PlatformCommands::system_info());

    match args.command {
        Command::Optimize {
            root,
            platform,
            web_dir,
            workers,
            deadline_secs,
            config,
            json,
            no_progress,
        } => {
            let mut settings = match config {
                Some(ref path) => Config::from_file(path).await?,
                None => Config::from_env(),
            };
            if let Some(root) = root {
                settings.project_root = root;
            }
            if let Some(platform) = platform {
                settings.target_platform = platform;
            }
            if web_dir.is_some() {
                settings.web_dir = web_dir;
            }
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if deadline_secs.is_some() {
                settings.deadline_secs = deadline_secs;
            }
            settings.json_output |= json;
            settings.show_progress &= !no_progress;

            let json_output = settings.json_output;
            let result = run_optimize(settings).await;
            if json_output {
                if let Err(ref e) = result {
                    JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
                }
            }
            result
        }
        Command::AndroidRelease { root } => {
            AndroidBuilder::new(&root, Arc::new(SystemTool::new()))
                .assemble_release()
                .await?;
            Ok(())
        }
    }
}

async fn run_optimize(config: Config) -> Result<()> {
    let optimizer = AssetOptimizer::new(config)?;
    let report = optimizer.run().await?.into_result()?;
    info!("Optimized {} files", report.files.len());
    Ok(())
}
