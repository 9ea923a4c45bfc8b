//! pcsync - Sync local m3u playlists to pCloud

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod library;
mod pcloud;
mod sync;
mod utils;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let timed_out = e
            .downcast_ref::<pcloud::GatewayError>()
            .is_some_and(|g| g.is_timeout());
        if timed_out {
            eprintln!("{} {:#} (raise it with -t/--timeout)", "error:".red().bold(), e);
        } else {
            eprintln!("{} {:#}", "error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completion { shell } = cli.command {
        cli::commands::completion(shell);
        return Ok(());
    }

    let (store, config) = cli::commands::load_config(&cli.global)?;
    init_logging(config.verbose);

    match &cli.command {
        Commands::Playlist(args) => {
            cli::commands::playlist(&cli.global, args, store, config).await?;
        }
        Commands::Token(args) => {
            cli::commands::token(&cli.global, args, store, config).await?;
        }
        Commands::Completion { .. } => {}
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "pcsync=debug,reqwest=debug"
    } else {
        "pcsync=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
