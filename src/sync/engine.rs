//! Playlist sync engine
//!
//! Each local playlist replaces the remote collection of the same name:
//! the old collection is deleted, a new one is created with the first page
//! of file ids, and the remaining pages are appended one call at a time.
//! Playlists are processed strictly one after another.

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::playlist::PlaylistDefinition;
use crate::library::MusicIndex;
use crate::pcloud::{GatewayError, PCloudClient};
use crate::utils::expand_home;

/// Tunables for one synchronization run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of file ids per create/append call
    pub page_size: usize,
    /// Pause before each append call
    pub pacing: Duration,
    /// Pause after deleting a collection, before re-creating it
    pub settle: Duration,
    /// Directory relative playlist paths are resolved against
    pub playlist_dir: Option<PathBuf>,
    /// Prefix removed from every track line
    pub strip_prefix: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            pacing: Duration::from_millis(250),
            settle: Duration::from_millis(500),
            playlist_dir: None,
            strip_prefix: String::new(),
        }
    }
}

/// What happened to one playlist file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistOutcome {
    /// Uploaded using `pages` write calls
    Synced {
        collection_id: u64,
        tracks: usize,
        pages: usize,
    },
    /// The playlist file does not exist
    Missing { path: PathBuf },
    /// The playlist file exists but could not be read
    Unreadable { path: PathBuf, reason: String },
    /// Tracks not present in the index; nothing was uploaded
    Unresolved { missing: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReport {
    pub name: String,
    pub outcome: PlaylistOutcome,
}

/// Result of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    pub playlists: Vec<PlaylistReport>,
}

impl SyncReport {
    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, PlaylistOutcome::Synced { .. }))
    }

    pub fn missing(&self) -> usize {
        self.count(|o| matches!(o, PlaylistOutcome::Missing { .. }))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| matches!(o, PlaylistOutcome::Unresolved { .. }))
    }

    pub fn unreadable(&self) -> usize {
        self.count(|o| matches!(o, PlaylistOutcome::Unreadable { .. }))
    }

    fn count(&self, pred: impl Fn(&PlaylistOutcome) -> bool) -> usize {
        self.playlists.iter().filter(|p| pred(&p.outcome)).count()
    }
}

/// Uploads local playlists as remote collections
pub struct PlaylistSynchronizer<'a> {
    client: &'a PCloudClient,
    index: &'a MusicIndex,
    options: SyncOptions,
    progress: MultiProgress,
}

impl<'a> PlaylistSynchronizer<'a> {
    /// Create a new synchronizer
    pub fn new(client: &'a PCloudClient, index: &'a MusicIndex, options: SyncOptions) -> Self {
        Self {
            client,
            index,
            options,
            progress: MultiProgress::new(),
        }
    }

    /// Draw progress somewhere other than stderr
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Synchronize every playlist file, in order
    ///
    /// A missing or unreadable file, or an unresolvable track, only affects
    /// that playlist.
    /// Any remote failure aborts the run.
    pub async fn synchronize(&self, files: &[String]) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        // Fetched once; kept current as collections are replaced
        let mut remote: HashMap<String, u64> = self
            .client
            .collection_list()
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();

        for file in files {
            let path = self.resolve_path(file);

            if !path.exists() {
                warn!("playlist file does not exist: {}", path.display());
                report.playlists.push(PlaylistReport {
                    name: file.clone(),
                    outcome: PlaylistOutcome::Missing { path },
                });
                continue;
            }

            let playlist = match PlaylistDefinition::read(&path, &self.options.strip_prefix) {
                Ok(playlist) => playlist,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!("skipping playlist: {}", reason);
                    report.playlists.push(PlaylistReport {
                        name: file.clone(),
                        outcome: PlaylistOutcome::Unreadable { path, reason },
                    });
                    continue;
                }
            };
            let outcome = self.sync_playlist(&playlist, &mut remote).await?;
            report.playlists.push(PlaylistReport {
                name: playlist.name,
                outcome,
            });
        }

        Ok(report)
    }

    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = expand_home(file);
        match &self.options.playlist_dir {
            Some(dir) => dir.join(path),
            None => path,
        }
    }

    async fn sync_playlist(
        &self,
        playlist: &PlaylistDefinition,
        remote: &mut HashMap<String, u64>,
    ) -> Result<PlaylistOutcome, GatewayError> {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Creating playlist {}...", playlist.name));

        let ids = match self.resolve_ids(playlist) {
            Ok(ids) => ids,
            Err(missing) => {
                for track in &missing {
                    warn!("{}: track not in music index (stale cache?): {}", playlist.name, track);
                }
                spinner.finish_with_message(format!(
                    "Failed: {} ({} unresolved tracks)",
                    playlist.name,
                    missing.len()
                ));
                return Ok(PlaylistOutcome::Unresolved { missing });
            }
        };

        if let Some(old_id) = remote.remove(&playlist.name) {
            debug!("Deleting existing collection {} ({})", playlist.name, old_id);
            self.client.collection_delete(old_id).await?;
            tokio::time::sleep(self.options.settle).await;
        }

        let (collection_id, pages) = self.upload(&playlist.name, &ids).await?;
        remote.insert(playlist.name.clone(), collection_id);

        info!(
            "Created playlist {} with {} tracks using {} pages",
            playlist.name,
            ids.len(),
            pages
        );
        spinner.finish_with_message(format!(
            "Playlist synced: {} ({} tracks, {} pages)",
            playlist.name,
            ids.len(),
            pages
        ));

        Ok(PlaylistOutcome::Synced {
            collection_id,
            tracks: ids.len(),
            pages,
        })
    }

    /// Map every track to its file id, or list all tracks that have none
    fn resolve_ids(&self, playlist: &PlaylistDefinition) -> Result<Vec<u64>, Vec<String>> {
        let mut ids = Vec::with_capacity(playlist.tracks.len());
        let mut missing = Vec::new();

        for track in &playlist.tracks {
            match self.index.get(track) {
                Some(id) => ids.push(id),
                None => missing.push(track.clone()),
            }
        }

        if missing.is_empty() { Ok(ids) } else { Err(missing) }
    }

    /// Create the collection from the first page and append the rest
    ///
    /// Returns the new collection id and the number of write calls made.
    async fn upload(&self, name: &str, ids: &[u64]) -> Result<(u64, usize), GatewayError> {
        let page_size = self.options.page_size.max(1);
        let mut pages = ids.chunks(page_size);

        let first = pages.next().unwrap_or_default();
        let collection = self.client.collection_create(name, first).await?;
        let mut count = 1;

        for page in pages {
            tokio::time::sleep(self.options.pacing).await;
            self.client.collection_link_files(collection.id, page).await?;
            count += 1;
        }

        Ok((collection.id, count))
    }
}
