//! Per-user session state: the guest token and Google credentials.
//!
//! Lives at ~/.config/agenda/session.toml and holds tokens, so it is
//! written owner-only.

use std::path::{Path, PathBuf};

use agenda_core::PartitionKey;
use agenda_core::config::AgendaConfig;
use agenda_core::credentials::Credentials;
use agenda_core::identity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Guest session token, minted on first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default)]
    pub guest_mode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl SessionState {
    pub fn path() -> Result<PathBuf> {
        Ok(AgendaConfig::config_dir()?.join("session.toml"))
    }

    /// Load the session, starting fresh when there is none.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(SessionState::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session from {}", path.display()))?;

        match toml::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable session file, starting a new session");
                Ok(SessionState::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize session")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Resolve the partition key, minting a guest token if needed.
    ///
    /// Returns whether the session changed and must be saved.
    pub fn partition_key(&mut self) -> Result<(PartitionKey, bool)> {
        let before = self.session_id.clone();
        let key = identity::resolve(self.credentials.as_ref(), &mut self.session_id)?;
        Ok((key, before != self.session_id))
    }

    /// Forget everything and start as a guest.
    pub fn start_guest(&mut self) {
        *self = SessionState {
            guest_mode: true,
            ..Default::default()
        };
    }
}
