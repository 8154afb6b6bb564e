//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `cultureradar.toml` configuration file
//! 3. Defaults
//!
//! Inside the configuration file, `${VAR_NAME}` expands to the value of
//! the environment variable of that name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// External API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the CultureRadar REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Gating policy configuration
///
/// Two deployments exist: one gates slot toggles on authentication only,
/// the other additionally requires an active subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Require an active subscription before a slot can be toggled
    #[serde(default)]
    pub require_subscription: bool,
}

/// Local session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path to the SQLite database file holding the auth session
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Main configuration for the CultureRadar client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Gating policy settings
    #[serde(default)]
    pub gating: GatingConfig,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_base_url() -> String {
    "https://fastapi-cultureradar.onrender.com".to_string()
}

fn default_db_path() -> String {
    "data/cultureradar.db".to_string()
}

impl Config {
    /// Expand `${VAR_NAME}` references to environment variable values.
    ///
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let toml_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded = Self::expand_env_vars(&toml_content);

        let mut config: Config = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables and defaults only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load `cultureradar.toml` if present, otherwise environment/defaults
    pub fn load() -> Result<Self> {
        let path = Path::new("cultureradar.toml");
        if path.exists() {
            Self::from_toml_file(path)
        } else {
            Ok(Self::from_env())
        }
    }

    /// Environment variables take precedence over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("RADAR_API_BASE") {
            if !base.is_empty() {
                self.api.base_url = base;
            }
        }
        if let Ok(v) = std::env::var("RADAR_REQUIRE_SUBSCRIPTION") {
            self.gating.require_subscription = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(path) = std::env::var("RADAR_SESSION_DB") {
            if !path.is_empty() {
                self.session.db_path = path;
            }
        }
    }
}
