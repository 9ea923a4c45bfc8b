//! Session management: reuse the stored auth token or log in again

use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::{Input, Password};
use std::io::IsTerminal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigStore, Credential};
use crate::pcloud::PCloudClient;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username/password required: need terminal device")]
    NoTerminal,
}

/// Source of interactive login details
pub trait Prompt {
    /// Whether a human can be asked for a password
    fn is_interactive(&self) -> bool;
    fn username(&self) -> Result<String>;
    fn password(&self) -> Result<String>;
}

/// Prompts on the controlling terminal
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn username(&self) -> Result<String> {
        Input::new()
            .with_prompt("Enter pCloud username")
            .interact_text()
            .context("Failed to read username")
    }

    fn password(&self) -> Result<String> {
        Password::new()
            .with_prompt("Enter pCloud password")
            .interact()
            .context("Failed to read password")
    }
}

/// Owns the credential lifecycle for one run
pub struct SessionManager<'a, P: Prompt> {
    store: &'a ConfigStore,
    prompt: P,
}

impl<'a, P: Prompt> SessionManager<'a, P> {
    pub fn new(store: &'a ConfigStore, prompt: P) -> Self {
        Self { store, prompt }
    }

    /// Authenticate `client` for the rest of the run
    ///
    /// Uses the stored token while it is unexpired unless `force` is set;
    /// otherwise logs in interactively and persists the new token.
    pub async fn authenticate(
        &self,
        config: &mut Config,
        client: &mut PCloudClient,
        force: bool,
    ) -> Result<Credential> {
        if force {
            debug!("Re-authentication forced, ignoring stored token");
        } else if let Some(credential) = &config.auth {
            if credential.is_usable(Utc::now()) {
                debug!("Using stored auth token (expires {})", credential.expires);
                client.set_auth(&credential.token);
                return Ok(credential.clone());
            }
            warn!("auth token expired; re-authentication required.");
        }

        self.login(config, client).await
    }

    async fn login(&self, config: &mut Config, client: &mut PCloudClient) -> Result<Credential> {
        if !self.prompt.is_interactive() {
            return Err(AuthError::NoTerminal.into());
        }

        let username = if config.username.is_empty() {
            self.prompt.username()?
        } else {
            config.username.clone()
        };
        let password = self.prompt.password()?;

        let info = client.userinfo(&username, &password).await?;
        let credential = Credential::issue(info.auth, Utc::now());
        client.set_auth(&credential.token);

        self.store
            .persist_credential(&credential, Some(&username))
            .context("Failed to save auth token")?;
        info!("Auth token saved to {}", self.store.path().display());

        config.username = username;
        config.auth = Some(credential.clone());
        Ok(credential)
    }
}
