//! Configuration document and its on-disk store

mod settings;
mod store;

pub use settings::{Config, ConfigError, Credential, PlaylistSettings};
pub use store::ConfigStore;
