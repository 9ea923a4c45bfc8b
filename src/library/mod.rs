//! Remote music library: cached tree listing and the track index built from it

pub mod index;
pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

pub use index::MusicIndex;
pub use snapshot::{RemoteTreeSnapshot, TreeCache};

/// Problems with the listing data itself
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("unable to decode music folder from {}; corrupt cache? ({reason})", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("track entry {0} has no file id")]
    MalformedEntry(String),

    #[error("listing of {0} has no folder contents")]
    MissingContents(String),
}
