//! CLI command handlers

use anyhow::{Context, Result};
use clap_complete::generate;
use colored::Colorize;
use std::io;
use std::sync::Arc;

use super::{GlobalArgs, PlaylistArgs, SessionManager, TerminalPrompt, TokenArgs};
use crate::config::{Config, ConfigStore, PlaylistSettings};
use crate::library::{MusicIndex, TreeCache};
use crate::pcloud::{HttpGateway, IssuedToken, PCloudClient};
use crate::sync::{PlaylistOutcome, PlaylistSynchronizer, SyncOptions, SyncReport};

/// Open the config store named on the command line, or the default one
pub fn open_store(global: &GlobalArgs) -> Result<ConfigStore> {
    match &global.config {
        Some(path) => Ok(ConfigStore::at(path.clone())),
        None => ConfigStore::default_location(),
    }
}

/// Load the configuration and apply the global command-line overrides
pub fn load_config(global: &GlobalArgs) -> Result<(ConfigStore, Config)> {
    let store = open_store(global)?;
    let mut config = store.load()?;
    global.apply(&mut config);
    Ok((store, config))
}

/// Build an authenticated client for this run
async fn connect(global: &GlobalArgs, store: &ConfigStore, config: &mut Config) -> Result<PCloudClient> {
    let gateway = HttpGateway::new(&config.endpoint, config.request_timeout())?;
    let mut client = PCloudClient::new(Arc::new(gateway));

    SessionManager::new(store, TerminalPrompt)
        .authenticate(config, &mut client, global.reauth)
        .await?;

    Ok(client)
}

fn save_overrides(global: &GlobalArgs, store: &ConfigStore, config: &Config) -> Result<()> {
    if global.save {
        store.save(config).context("Failed to save configuration")?;
        println!("Configuration saved to {}", store.path().display());
    }
    Ok(())
}

pub fn sync_options(settings: &PlaylistSettings) -> SyncOptions {
    SyncOptions {
        page_size: settings.page_size,
        pacing: settings.pacing(),
        settle: settings.settle(),
        playlist_dir: settings.playlist_dir(),
        strip_prefix: settings.strip_prefix.clone(),
    }
}

/// Handle the `playlist` command
pub async fn playlist(
    global: &GlobalArgs,
    args: &PlaylistArgs,
    store: ConfigStore,
    mut config: Config,
) -> Result<()> {
    args.apply(&mut config);
    config.validate_playlist(args.refresh_cache)?;
    save_overrides(global, &store, &config)?;

    let client = connect(global, &store, &mut config).await?;

    if args.list {
        let collections = client.collection_list().await?;
        if collections.is_empty() {
            println!("{}", "No playlists found.".yellow());
        }
        for collection in &collections {
            println!("{}", collection.name);
        }
        return Ok(());
    }

    if args.files.is_empty() {
        println!("nothing to do");
        return Ok(());
    }

    let settings = &config.playlist;
    let cache = TreeCache::new(&settings.library_root, settings.cache_path(), args.refresh_cache);
    let snapshot = cache.load(&client).await?;
    let index = MusicIndex::build(&snapshot, &settings.suffixes)?;
    println!("Indexed {} tracks under {}", index.len(), settings.library_root.cyan());

    let report = PlaylistSynchronizer::new(&client, &index, sync_options(settings))
        .synchronize(&args.files)
        .await?;

    print_report(&report);

    if failed_playlists(&report) > 0 {
        anyhow::bail!(
            "{} playlist(s) could not be synced ({} unresolved, {} unreadable)",
            failed_playlists(&report),
            report.unresolved(),
            report.unreadable()
        );
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!();
    for playlist in &report.playlists {
        match &playlist.outcome {
            PlaylistOutcome::Synced { tracks, pages, .. } => {
                println!("  {} {} ({} tracks, {} pages)", "✓".green(), playlist.name, tracks, pages);
            }
            PlaylistOutcome::Missing { path } => {
                println!("  {} {} (file not found: {})", "-".yellow(), playlist.name, path.display());
            }
            PlaylistOutcome::Unreadable { reason, .. } => {
                println!("  {} {} ({})", "✗".red(), playlist.name, reason);
            }
            PlaylistOutcome::Unresolved { missing } => {
                println!("  {} {} ({} unresolved tracks)", "✗".red(), playlist.name, missing.len());
                for track in missing {
                    println!("      {}", track);
                }
            }
        }
    }

    println!();
    let headline = if failed_playlists(report) == 0 {
        "Sync complete!".green().bold()
    } else {
        "Sync finished with errors".red().bold()
    };
    println!("{}", headline);
    println!("  Playlists synced: {}", report.synced());
    println!("  Missing files: {}", report.missing());
    println!("  Unresolved playlists: {}", report.unresolved());
    println!("  Unreadable files: {}", report.unreadable());
}

/// Playlists that were asked for but not uploaded, missing files aside
fn failed_playlists(report: &SyncReport) -> usize {
    report.unresolved() + report.unreadable()
}

/// Handle the `token` command
pub async fn token(
    global: &GlobalArgs,
    args: &TokenArgs,
    store: ConfigStore,
    mut config: Config,
) -> Result<()> {
    save_overrides(global, &store, &config)?;

    if !args.list && args.delete.is_none() {
        println!("nothing to do");
        return Ok(());
    }

    let client = connect(global, &store, &mut config).await?;
    let tokens = client.list_tokens().await?;

    if args.list {
        for token in &tokens {
            println!("{}", format_token(token));
        }
    }

    if let Some(token_id) = args.delete {
        let token = find_token(&tokens, token_id)?;
        client.delete_token(token.token_id).await?;
        println!("{} token {}", "Deleted".green(), token.token_id);
    }

    Ok(())
}

fn format_token(token: &IssuedToken) -> String {
    let line = format!("{:>10}: {} {}", token.token_id, token.expires, token.device);
    if token.current {
        format!("{} {}", line, "(current)".cyan())
    } else {
        line
    }
}

fn find_token(tokens: &[IssuedToken], token_id: u64) -> Result<&IssuedToken> {
    tokens
        .iter()
        .find(|t| t.token_id == token_id)
        .ok_or_else(|| anyhow::anyhow!("no such token_id: {}", token_id))
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = <super::Cli as clap::CommandFactory>::command();
    generate(shell, &mut cmd, "pcsync", &mut io::stdout());
}
