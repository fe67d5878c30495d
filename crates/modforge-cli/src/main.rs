//! # modforge
//!
//! Command-line front end for the modforge module proxy.
//!
//! Loads `modforge.toml`, builds the configured backends in precedence order
//! and answers release, metadata and download queries against them.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use modforge_core::error::ForgeResult;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Module forge proxy over git repositories, archive directories and upstream forges
#[derive(Parser)]
#[command(name = "modforge", version, about = "Module forge proxy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: nearest modforge.toml)
    #[arg(short, long, global = true, env = "MODFORGE_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the releases document of a module and its dependencies
    Releases {
        /// Module as author/name
        module: String,
    },
    /// Print the metadata document of a module
    Metadata {
        /// Module as author/name
        module: String,
    },
    /// List every release every backend can enumerate
    List,
    /// Download a release archive
    Download {
        /// Module as author/name
        module: String,
        version: String,
        /// Directory to write the archive to
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Drop cached mirrors and upstream listings
    ClearCache {
        /// Only this module (author/name)
        module: Option<String>,
    },
    /// Load and validate the configuration
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_json);
    setup_panic_handler();

    info!("Starting modforge v{}", env!("CARGO_PKG_VERSION"));

    let formatter = ErrorFormatter::new();
    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", formatter.format_simple(&format!("{:#}", e)));
            return ExitCode::FAILURE;
        },
    };

    match runtime.block_on(run_cli(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")
}

async fn run_cli(cli: Cli) -> ForgeResult<()> {
    let ctx = CommandContext::load(cli.config.as_deref()).await?;
    commands::dispatch_command(cli.command, &ctx).await
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("modforge={}", level)));

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

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("modforge encountered an unexpected error: {}", panic_info);
        eprintln!("modforge crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
