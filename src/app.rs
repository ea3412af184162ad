//! Everything a command needs: configuration, the ledger and the session.

use std::path::PathBuf;

use agenda_core::config::AgendaConfig;
use agenda_core::store::EventStore;
use agenda_core::{AgendaError, Ledger, PartitionKey};
use agenda_provider_google::GoogleCalendar;
use anyhow::Result;

use crate::session::SessionState;

pub struct App {
    pub config: AgendaConfig,
    pub ledger: Ledger,
    pub session: SessionState,
    session_path: PathBuf,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = AgendaConfig::load()?;
        let ledger = Ledger::new(EventStore::new(config.events_dir()), config.time_zone()?);
        let session_path = SessionState::path()?;
        let session = SessionState::load(&session_path)?;

        Ok(App {
            config,
            ledger,
            session,
            session_path,
        })
    }

    pub fn save_session(&self) -> Result<()> {
        self.session.save(&self.session_path)
    }

    /// The partition this session reads and writes, persisting a newly minted guest token.
    pub fn partition_key(&mut self) -> Result<PartitionKey> {
        let (key, changed) = self.session.partition_key()?;
        if changed {
            self.save_session()?;
        }
        Ok(key)
    }

    /// A Google client for the signed-in user, refreshing an expired token first.
    ///
    /// `None` for guests.
    pub async fn google(&mut self) -> Result<Option<GoogleCalendar>> {
        let Some(credentials) = self.session.credentials.as_ref() else {
            return Ok(None);
        };

        if credentials.is_expired() {
            let refreshed = agenda_provider_google::auth::refresh(credentials).await.map_err(|e| {
                tracing::warn!(error = %e, "could not refresh Google token");
                AgendaError::AuthRequired
            })?;
            self.session.credentials = Some(refreshed);
            self.save_session()?;
        }

        Ok(self
            .session
            .credentials
            .as_ref()
            .map(|c| GoogleCalendar::new(c, &self.config.calendar_id)))
    }

    /// Like [`App::google`], but guests get [`AgendaError::AuthRequired`].
    pub async fn require_google(&mut self) -> Result<GoogleCalendar> {
        if !self.config.google.enabled() {
            anyhow::bail!("{}", google_not_configured());
        }
        self.google().await?.ok_or_else(|| AgendaError::AuthRequired.into())
    }
}

pub fn google_not_configured() -> String {
    "Google OAuth is not configured.\n\n\
    Set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET, or add to ~/.config/agenda/config.toml:\n\n\
    [google]\n\
    client_id = \"your-client-id.apps.googleusercontent.com\"\n\
    client_secret = \"your-client-secret\""
        .to_string()
}
