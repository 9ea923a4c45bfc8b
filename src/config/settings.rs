//! Typed configuration document
//!
//! The on-disk format is a flat JSON object with one sub-object per aspect.
//! Keys written by older versions of the playlist tool (`chunk_size`,
//! `music_folder`, `playlist_prefix`) are still accepted.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::utils::expand_home;

pub const DEFAULT_ENDPOINT: &str = "https://eapi.pcloud.com";

/// Page sizes above this are rejected outright
pub const MAX_PAGE_SIZE: usize = 1000;

/// Errors found while validating a merged configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid page size specified: {0} (must be 1..=1000)")]
    InvalidPageSize(usize),

    #[error("cache file name must be provided to refresh the cache")]
    RefreshWithoutCache,

    #[error("at least one recognized file suffix is required")]
    EmptySuffixes,

    #[error("config file does not exist: {}", .0.display())]
    MissingConfigFile(PathBuf),
}

/// Reusable session token and its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(deserialize_with = "deserialize_expiry")]
    pub expires: DateTime<Utc>,
}

impl Credential {
    /// Tokens issued by userinfo are valid for one year
    pub fn issue(token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires: now + chrono::Duration::days(365),
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }
}

/// Accepts RFC 3339 or the asctime format (`Mon Jan 15 10:00:00 2024`,
/// local time) that older config files contain.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expiry(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid expiry: {raw}")))
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%a %b %e %H:%M:%S %Y").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Playlist aspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    /// Where the remote tree snapshot is cached (empty disables caching)
    pub cache_file: String,
    #[serde(alias = "chunk_size")]
    pub page_size: usize,
    /// Remote folder holding the music library
    #[serde(alias = "music_folder")]
    pub library_root: String,
    pub suffixes: Vec<String>,
    /// Local directory playlist file arguments are relative to
    pub playlist_dir: String,
    /// Stripped from the front of every playlist line
    #[serde(alias = "playlist_prefix")]
    pub strip_prefix: String,
    /// Delay between successive append calls
    pub pacing_ms: u64,
    /// Delay after deleting a collection before re-creating it
    pub settle_ms: u64,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            cache_file: String::new(),
            page_size: 100,
            library_root: "/Music".to_string(),
            suffixes: vec![".mp3".to_string()],
            playlist_dir: "./".to_string(),
            strip_prefix: String::new(),
            pacing_ms: 250,
            settle_ms: 500,
        }
    }
}

impl PlaylistSettings {
    pub fn cache_path(&self) -> Option<PathBuf> {
        if self.cache_file.is_empty() {
            None
        } else {
            Some(expand_home(&self.cache_file))
        }
    }

    pub fn playlist_dir(&self) -> Option<PathBuf> {
        if self.playlist_dir.is_empty() {
            None
        } else {
            Some(expand_home(&self.playlist_dir))
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// The whole configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    /// Request timeout in seconds, 0 disables it
    pub timeout: u64,
    pub username: String,
    pub verbose: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credential>,
    pub playlist: PlaylistSettings,
    /// Keys this version does not know about, kept on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: 60,
            username: String::new(),
            verbose: false,
            auth: None,
            playlist: PlaylistSettings::default(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Check the playlist aspect once all overrides are applied
    pub fn validate_playlist(&self, refresh_cache: bool) -> Result<(), ConfigError> {
        let playlist = &self.playlist;
        if playlist.page_size == 0 || playlist.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(playlist.page_size));
        }
        if refresh_cache && playlist.cache_file.is_empty() {
            return Err(ConfigError::RefreshWithoutCache);
        }
        if playlist.suffixes.iter().all(|s| s.is_empty()) {
            return Err(ConfigError::EmptySuffixes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_credential_usable_iff_before_expiry() {
        let now = Utc::now();
        let cred = Credential::issue("tok", now);
        assert!(cred.is_usable(now));
        assert!(cred.is_usable(now + chrono::Duration::days(364)));
        assert!(!cred.is_usable(cred.expires));
        assert!(!cred.is_usable(cred.expires + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_credential_issue_is_one_year() {
        let now = Utc::now();
        let cred = Credential::issue("tok", now);
        assert_eq!(cred.expires - now, chrono::Duration::seconds(31_536_000));
    }

    #[test]
    fn test_parse_rfc3339_expiry() {
        let cred: Credential = serde_json::from_value(serde_json::json!({
            "token": "abc",
            "expires": "2030-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(cred.expires.year(), 2030);
    }

    #[test]
    fn test_parse_legacy_asctime_expiry() {
        let parsed = parse_expiry("Mon Jan 15 10:00:00 2024").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert!(parse_expiry("not a date").is_none());
    }

    #[test]
    fn test_legacy_playlist_keys_accepted() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "endpoint": "https://api.pcloud.com",
            "playlist": {
                "cache_file": "~/.cache/music.json",
                "chunk_size": 250,
                "music_folder": "/Audio",
                "playlist_prefix": "/rep/music"
            }
        }))
        .unwrap();
        assert_eq!(config.playlist.page_size, 250);
        assert_eq!(config.playlist.library_root, "/Audio");
        assert_eq!(config.playlist.strip_prefix, "/rep/music");
        assert_eq!(config.playlist.suffixes, vec![".mp3".to_string()]);
        assert_eq!(config.timeout, 60);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "token": {"list": true},
            "username": "me"
        }))
        .unwrap();
        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["token"], serde_json::json!({"list": true}));
        assert_eq!(back["username"], "me");
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = Config::default();
        config.playlist.page_size = 0;
        assert_eq!(
            config.validate_playlist(false),
            Err(ConfigError::InvalidPageSize(0))
        );
        config.playlist.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate_playlist(false).is_err());
        config.playlist.page_size = 300;
        assert!(config.validate_playlist(false).is_ok());
    }

    #[test]
    fn test_validate_refresh_requires_cache_file() {
        let config = Config::default();
        assert_eq!(
            config.validate_playlist(true),
            Err(ConfigError::RefreshWithoutCache)
        );
    }

    #[test]
    fn test_validate_suffixes_not_empty() {
        let mut config = Config::default();
        config.playlist.suffixes.clear();
        assert_eq!(config.validate_playlist(false), Err(ConfigError::EmptySuffixes));
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let mut config = Config::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
        config.timeout = 0;
        assert_eq!(config.request_timeout(), None);
    }
}
