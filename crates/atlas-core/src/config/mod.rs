mod database;
mod logging;

pub use database::DatabaseConfig;
pub use logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AtlasError, Result};

/// Root configuration for Atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Database configuration. Checked when a pool is opened.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Country source API configuration. Only the loader needs it.
    #[serde(default)]
    pub source: SourceConfig,

    /// Dashboard server configuration.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AtlasConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AtlasError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        let config: Self = toml::from_str(&content)
            .map_err(|e| AtlasError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// Reads `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DB`,
    /// `POSTGRES_PORT` and `COUNTRIES_API_URL`. The database host is always
    /// `localhost`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut database = DatabaseConfig {
            user: lookup("POSTGRES_USER").unwrap_or_default(),
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
            name: lookup("POSTGRES_DB").unwrap_or_default(),
            ..Default::default()
        };
        if let Some(port) = lookup("POSTGRES_PORT").filter(|p| !p.is_empty()) {
            database.port = port
                .trim()
                .parse()
                .map_err(|_| AtlasError::Config(format!("Invalid POSTGRES_PORT: {}", port)))?;
        }

        let config = Self {
            database,
            source: SourceConfig {
                url: lookup("COUNTRIES_API_URL").unwrap_or_default(),
                timeout_secs: None,
            },
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check settings every command needs. Database settings are checked
    /// when a pool is opened, so a dry-run load works without them.
    pub fn validate(&self) -> Result<()> {
        if self.dashboard.page_size == 0 {
            return Err(AtlasError::Config(
                "dashboard.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Country source API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning a JSON array of countries.
    #[serde(default)]
    pub url: String,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Host to bind to.
    #[serde(default = "default_dashboard_host")]
    pub host: String,

    /// HTTP port.
    #[serde(default = "default_dashboard_port")]
    pub port: u16,

    /// Rows per grid page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Page heading.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_dashboard_host(),
            port: default_dashboard_port(),
            page_size: default_page_size(),
            title: default_title(),
        }
    }
}

fn default_dashboard_host() -> String {
    "0.0.0.0".to_string()
}

fn default_dashboard_port() -> u16 {
    8050
}

fn default_page_size() -> usize {
    15
}

fn default_title() -> String {
    "Countries Dashboard".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static pattern");

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
