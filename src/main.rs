//! Shelter - offline asset cache for a static site
//!
//! CLI entry point that dispatches to subcommands.

use clap::{CommandFactory, Parser};
use console::style;
use shelter::cli::{commands, Cli, Commands};
use shelter::config::{Config, ConfigManager};
use shelter::error::ShelterResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn (cache-write failures only), 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("shelter=warn"),
        1 => EnvFilter::new("shelter=info"),
        _ => EnvFilter::new("shelter=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run() -> ShelterResult<()> {
    let cli = Cli::parse();

    // Completions need nothing else
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "shelter", &mut std::io::stdout());
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;
    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    ConfigManager::ensure_state_dirs().await?;

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Install(args) => commands::install(args, &config).await,
        Commands::Activate(args) => commands::activate(args, &config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Partitions(args) => commands::partitions(args).await,
        Commands::Push(args) => commands::push(args, &config).await,
        Commands::Click(args) => commands::click(args, &config).await,
        Commands::Message(args) => commands::message(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}
