//! Remote tree snapshot and its on-disk cache
//!
//! Listing a large music library recursively is slow, so the listing can be
//! cached in a JSON file. The cache records which remote folder it was taken
//! from; a cache for a different folder is never used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::LibraryError;
use crate::pcloud::{PCloudClient, RemoteEntry};

/// Recursive listing of one remote folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTreeSnapshot {
    /// Remote folder the listing was taken from. Caches written by older
    /// versions lack this and carry the path on the root entry instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_path: Option<String>,
    pub metadata: RemoteEntry,
}

impl RemoteTreeSnapshot {
    pub fn new(source_path: &str, metadata: RemoteEntry) -> Self {
        Self {
            source_path: Some(source_path.to_string()),
            metadata,
        }
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path
            .as_deref()
            .or(self.metadata.path.as_deref())
    }

    /// Whether this snapshot was taken from `root`
    pub fn matches_root(&self, root: &str) -> bool {
        self.source_path()
            .is_some_and(|source| normalize_root(source) == normalize_root(root))
    }

    /// Read a cached snapshot; any structural problem is a corrupt cache
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file {}", path.display()))?;

        let corrupt = |reason: String| {
            anyhow::Error::from(LibraryError::CorruptCache {
                path: path.to_path_buf(),
                reason,
            })
        };

        let snapshot: Self = serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))?;
        if snapshot.metadata.contents.is_none() {
            return Err(corrupt("root folder has no contents".to_string()));
        }
        Ok(snapshot)
    }

    /// Write the snapshot, creating parent directories as needed
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
            }
        }

        let contents = serde_json::to_string(self).context("Failed to serialize music cache")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write cache file {}", path.display()))?;

        debug!("Cached music collection to {}", path.display());
        Ok(())
    }
}

fn normalize_root(root: &str) -> &str {
    match root.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Decides between a fresh remote listing and the cached one
#[derive(Debug, Clone)]
pub struct TreeCache {
    root: String,
    cache_file: Option<PathBuf>,
    refresh: bool,
}

impl TreeCache {
    pub fn new(root: &str, cache_file: Option<PathBuf>, refresh: bool) -> Self {
        Self {
            root: root.to_string(),
            cache_file,
            refresh,
        }
    }

    /// Produce the snapshot for the configured library root
    pub async fn load(&self, client: &PCloudClient) -> Result<RemoteTreeSnapshot> {
        let cache_file = match &self.cache_file {
            Some(path) if path.exists() && !self.refresh => path,
            _ => return self.fetch_and_store(client).await,
        };

        info!("Loading music collection from cache file...");
        let snapshot = RemoteTreeSnapshot::read(cache_file)?;

        if snapshot.matches_root(&self.root) {
            return Ok(snapshot);
        }

        // A cache for another folder is corrected at read time only; the
        // file is rewritten when a refresh is requested explicitly.
        warn!(
            "Cache {} was built from {:?}, not {}; listing remote folder instead",
            cache_file.display(),
            snapshot.source_path().unwrap_or("an unknown folder"),
            self.root
        );
        self.fetch(client).await
    }

    async fn fetch_and_store(&self, client: &PCloudClient) -> Result<RemoteTreeSnapshot> {
        let snapshot = self.fetch(client).await?;
        if let Some(path) = &self.cache_file {
            snapshot.write(path)?;
            info!("Cached music collection to {}", path.display());
        }
        Ok(snapshot)
    }

    async fn fetch(&self, client: &PCloudClient) -> Result<RemoteTreeSnapshot> {
        info!("Loading music collection from pCloud...");
        let listing = client.list_folder(&self.root).await?;
        Ok(RemoteTreeSnapshot::new(&self.root, listing.metadata))
    }
}
