//! Playlist sync module

pub mod engine;
pub mod playlist;

pub use engine::{PlaylistOutcome, PlaylistReport, PlaylistSynchronizer, SyncOptions, SyncReport};
pub use playlist::PlaylistDefinition;
