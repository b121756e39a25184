use serde::Deserialize;
use std::{env, fs, io, time::Duration};
use thiserror::Error;

const SETTINGS_FILENAME: &str = "settings.json";
const ENV_FILENAME: &str = ".env.local";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings.json: {0}")]
    Read(#[from] io::Error),

    #[error("cannot parse settings.json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    pub store_path: String,
    pub collection_name: String,
    pub allowed_origin: String,
    pub insert_timeout_secs: u64,
    pub operation_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tcp_socket_binding: "0.0.0.0".into(),
            tcp_socket_port: 8080,
            store_path: "tasks.redb".into(),
            collection_name: "tasks".into(),
            allowed_origin: "*".into(),
            insert_timeout_secs: 10,
            operation_timeout_secs: 5,
        }
    }
}

impl Settings {
    /// `settings.json` if present, then `.env.local`, then the process
    /// environment. Later sources win.
    pub fn load() -> Result<Settings, SettingsError> {
        let mut settings = match fs::read_to_string(SETTINGS_FILENAME) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };

        if dotenvy::from_filename(ENV_FILENAME).is_ok() {
            tracing::debug!(file = ENV_FILENAME, "loaded environment file");
        }
        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay values from `lookup` (normally the environment) onto these settings.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.tcp_socket_binding = host;
        }
        if let Some(port) = lookup("PORT") {
            self.tcp_socket_port = parse_env("PORT", port)?;
        }
        if let Some(path) = lookup("STORE_PATH") {
            self.store_path = path;
        }
        if let Some(name) = lookup("COLLECTION_NAME") {
            self.collection_name = name;
        }
        if let Some(origin) = lookup("ALLOWED_ORIGIN") {
            self.allowed_origin = origin;
        }
        if let Some(secs) = lookup("INSERT_TIMEOUT_SECS") {
            self.insert_timeout_secs = parse_env("INSERT_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = lookup("OPERATION_TIMEOUT_SECS") {
            self.operation_timeout_secs = parse_env("OPERATION_TIMEOUT_SECS", secs)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.insert_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout("insert_timeout_secs"));
        }
        if self.operation_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout("operation_timeout_secs"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.tcp_socket_binding, self.tcp_socket_port)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            insert: Duration::from_secs(self.insert_timeout_secs),
            operation: Duration::from_secs(self.operation_timeout_secs),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnv { key, value })
}

/// Store call budgets. Inserts get their own, longer, budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub insert: Duration,
    pub operation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Settings::default().timeouts()
    }
}
