use std::path::Path;

use chrono::Duration;
use database::DatabaseConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
}

/// Runtime settings. Read from an optional YAML file, then overridden by
/// `DATABASE_URL`, `JWT_SECRET`, `ACCESS_TOKEN_MINUTES` and
/// `REFRESH_TOKEN_DAYS`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: "change_me".to_string(),
            access_token_minutes: 60 * 24,
            refresh_token_days: 7,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads `path` if given, then applies the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_yaml(&yaml)?
            }
            None => Self::default(),
        };
        settings.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(value) = lookup("ACCESS_TOKEN_MINUTES") {
            self.access_token_minutes = parse_positive("ACCESS_TOKEN_MINUTES", value)?;
        }
        if let Some(value) = lookup("REFRESH_TOKEN_DAYS") {
            self.refresh_token_days = parse_positive("REFRESH_TOKEN_DAYS", value)?;
        }
        if self.jwt_secret == Settings::default().jwt_secret {
            log::warn!("JWT_SECRET is not set; using the development default");
        }
        Ok(self)
    }

    /// The CLI flag wins over `DATABASE_URL`, which wins over the file.
    pub fn database_config(&self, cli_arg: Option<String>) -> DatabaseConfig {
        DatabaseConfig::from_cli_or_env_or_yaml(cli_arg, self.database_url.clone())
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_days)
    }
}

fn parse_positive(name: &'static str, value: String) -> Result<i64, SettingsError> {
    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SettingsError::Env { name, value }),
    }
}
