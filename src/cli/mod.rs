//! CLI module for pcsync

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod commands;

pub use auth::{SessionManager, TerminalPrompt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "pcsync", about = "Sync local m3u playlists to pCloud")]
#[command(version, author)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// pCloud API endpoint
    #[arg(short, long, global = true, env = "PCLOUD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Alternate config file (must exist)
    #[arg(short = 'f', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force re-authentication (ignore the stored token)
    #[arg(short, long, global = true)]
    pub reauth: bool,

    /// Request timeout in seconds (0 disables it)
    #[arg(short, long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// pCloud username
    #[arg(short, long, global = true, env = "PCLOUD_USER")]
    pub username: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write command-line overrides back to the config file
    #[arg(long, global = true)]
    pub save: bool,
}

impl GlobalArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload local m3u playlists as pCloud playlists
    Playlist(PlaylistArgs),

    /// List or delete issued auth tokens
    Token(TokenArgs),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct PlaylistArgs {
    /// Cache file for the remote music listing
    #[arg(short = 'c', long, value_name = "FILE")]
    pub cache_file: Option<String>,

    /// Re-list the remote library and rewrite the cache file
    #[arg(short = 'C', long)]
    pub refresh_cache: bool,

    /// List remote playlists and exit
    #[arg(short, long)]
    pub list: bool,

    /// File ids per upload call
    #[arg(short = 's', long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Remote folder holding the music library
    #[arg(short = 'm', long, value_name = "PATH")]
    pub library_root: Option<String>,

    /// Recognized track file suffixes
    #[arg(long = "suffix", value_name = "SUFFIX", value_delimiter = ',')]
    pub suffixes: Vec<String>,

    /// Directory playlist files are relative to
    #[arg(short = 'd', long, value_name = "DIR")]
    pub playlist_dir: Option<String>,

    /// Prefix stripped from every track path in the playlists
    #[arg(short = 'p', long, value_name = "PREFIX")]
    pub strip_prefix: Option<String>,

    /// Milliseconds to wait between append calls
    #[arg(long, value_name = "MS")]
    pub pacing_ms: Option<u64>,

    /// Milliseconds to wait after deleting a playlist
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Local m3u playlist files
    #[arg(value_name = "PLAYLIST")]
    pub files: Vec<String>,
}

impl PlaylistArgs {
    pub fn apply(&self, config: &mut Config) {
        let playlist = &mut config.playlist;
        if let Some(cache_file) = &self.cache_file {
            playlist.cache_file = cache_file.clone();
        }
        if let Some(page_size) = self.page_size {
            playlist.page_size = page_size;
        }
        if let Some(root) = &self.library_root {
            playlist.library_root = root.clone();
        }
        if !self.suffixes.is_empty() {
            playlist.suffixes = self.suffixes.clone();
        }
        if let Some(dir) = &self.playlist_dir {
            playlist.playlist_dir = dir.clone();
        }
        if let Some(prefix) = &self.strip_prefix {
            playlist.strip_prefix = prefix.clone();
        }
        if let Some(pacing) = self.pacing_ms {
            playlist.pacing_ms = pacing;
        }
        if let Some(settle) = self.settle_ms {
            playlist.settle_ms = settle;
        }
    }
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// List issued tokens
    #[arg(short, long)]
    pub list: bool,

    /// Delete the token with this id
    #[arg(short, long, value_name = "TOKEN_ID")]
    pub delete: Option<u64>,
}
