//! Configuration persistence
//!
//! Stores the configuration document in ~/.config/pcloud.json unless another
//! file is named on the command line. The document holds the session token,
//! so files created here are owner read/write only.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::settings::{Config, ConfigError, Credential};

const CONFIG_FILE: &str = "pcloud.json";

/// Handle to the configuration document on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    /// An explicitly named file must exist
    required: bool,
}

impl ConfigStore {
    /// Store at the default location
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self {
            path: config_dir.join(CONFIG_FILE),
            required: false,
        })
    }

    /// Store at a file named by the user
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, falling back to defaults when the default file is absent
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            if self.required {
                return Err(ConfigError::MissingConfigFile(self.path.clone()).into());
            }
            debug!("No config found at {:?}, using defaults", self.path);
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("unable to read: {}", self.path.display()))?;

        debug!("Loaded config from {:?}", self.path);
        Ok(config)
    }

    /// Write the whole document
    pub fn save(&self, config: &Config) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        self.write(&contents)?;
        debug!("Saved config to {:?}", self.path);
        Ok(())
    }

    /// Replace only the stored credential (and the username, if none was stored)
    ///
    /// Re-reads the document first so command-line overrides held in memory
    /// are not written back as a side effect of logging in.
    pub fn persist_credential(&self, credential: &Credential, username: Option<&str>) -> Result<()> {
        let mut on_disk = if self.path.exists() {
            self.load()?
        } else {
            Config::default()
        };

        on_disk.auth = Some(credential.clone());
        if let Some(username) = username {
            if on_disk.username.is_empty() {
                on_disk.username = username.to_string();
            }
        }

        self.save(&on_disk)
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open config file {:?}", self.path))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;
        Ok(())
    }
}
