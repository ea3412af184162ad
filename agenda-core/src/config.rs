//! Agenda configuration.
//!
//! Layered with the `config` crate: built-in defaults, then
//! `~/.config/agenda/config.toml`, then environment variables.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{AgendaError, AgendaResult};

static DEFAULT_CALENDAR_ID: &str = "primary";
static DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 1500;

fn default_events_dir() -> String {
    dirs::data_dir()
        .map(|d| d.join("agenda").join("user_events").to_string_lossy().into_owned())
        .unwrap_or_else(|| "~/.local/share/agenda/user_events".to_string())
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Configuration at ~/.config/agenda/config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct AgendaConfig {
    /// Directory holding one JSON file per partition key.
    #[serde(default = "default_events_dir")]
    events_dir: String,

    /// IANA zone used to read and write wall-clock times. Host zone when unset.
    time_zone: Option<String>,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub advisor: AdvisorConfig,
}

/// OAuth client for Google Calendar. Google features are off without it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl GoogleConfig {
    /// `(client_id, client_secret)` when both are set.
    pub fn client(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().filter(|s| !s.is_empty())?;
        let secret = self.client_secret.as_deref().filter(|s| !s.is_empty())?;
        Some((id, secret))
    }

    pub fn enabled(&self) -> bool {
        self.client().is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Plain environment variables mapped onto config keys.
const DIRECT_ENV: [(&str, &str); 3] = [
    ("ANTHROPIC_API_KEY", "advisor.api_key"),
    ("GOOGLE_CLIENT_ID", "google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
];

impl AgendaConfig {
    pub fn config_dir() -> AgendaResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda"))
    }

    pub fn config_path() -> AgendaResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, creating a commented-out file on first run.
    pub fn load() -> AgendaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path, std::env::vars().collect())
    }

    /// Load from `path`, then apply overrides from `vars`.
    ///
    /// `AGENDA_TIME_ZONE` style variables map onto top-level keys and
    /// `AGENDA_GOOGLE__CLIENT_ID` style ones onto sections.
    pub fn load_from(path: &Path, vars: config::Map<String, String>) -> AgendaResult<Self> {
        let mut builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("AGENDA")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(vars.clone())),
            );

        for (var, key) in DIRECT_ENV {
            let value = vars.get(var).filter(|v| !v.is_empty()).cloned();
            builder = builder
                .set_override_option(key, value)
                .map_err(|e| AgendaError::Config(e.to_string()))?;
        }

        builder
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# Where event files are kept:
# events_dir = \"{}\"

# Time zone for event times (defaults to the system zone):
# time_zone = \"Europe/Warsaw\"

# Google calendar to sync with:
# calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# Google OAuth client (or GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET):
# [google]
# client_id = \"your-client-id.apps.googleusercontent.com\"
# client_secret = \"your-client-secret\"

# Scheduling advisor (or ANTHROPIC_API_KEY):
# [advisor]
# api_key = \"sk-ant-...\"
# model = \"{DEFAULT_MODEL}\"
# max_tokens = {DEFAULT_MAX_TOKENS}
",
            default_events_dir()
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AgendaError::Config(format!("Could not create config directory: {e}")))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn events_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.events_dir).into_owned())
    }

    /// The configured zone, else the host zone, else UTC.
    pub fn time_zone(&self) -> AgendaResult<Tz> {
        if let Some(name) = &self.time_zone {
            return name
                .parse::<Tz>()
                .map_err(|_| AgendaError::Config(format!("Unknown time zone '{name}'")));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "unrecognized system time zone, using UTC");
                Tz::UTC
            })),
            Err(e) => {
                tracing::warn!(error = %e, "could not determine system time zone, using UTC");
                Ok(Tz::UTC)
            }
        }
    }
}
