use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

use crate::error::{AtlasError, Result};

/// Database configuration.
///
/// Either `url` is set, or the connection is assembled from the individual
/// fields the way the loader and dashboard expect it (`host` defaults to
/// `localhost`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the individual fields.
    #[serde(default)]
    pub url: Option<String>,

    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database user.
    #[serde(default)]
    pub user: String,

    /// Database password.
    #[serde(default)]
    pub password: String,

    /// Database name.
    #[serde(default)]
    pub name: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            name: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Build sqlx connection options from this configuration.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return PgConnectOptions::from_str(url)
                .map_err(|e| AtlasError::Config(format!("Invalid database url: {}", e)));
        }

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }

    /// Connection target without credentials, for logs.
    pub fn display_target(&self) -> String {
        match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => match url.rsplit_once('@') {
                Some((_, target)) => target.to_string(),
                None => url.to_string(),
            },
            None => format!("{}:{}/{}", self.host, self.port, self.name),
        }
    }

    /// Check that a connection can be attempted. Only commands that open a
    /// pool call this.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(AtlasError::Config(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        if self.url.as_deref().is_some_and(|u| !u.is_empty()) {
            return Ok(());
        }
        if self.user.is_empty() {
            return Err(AtlasError::Config("database.user is required".to_string()));
        }
        if self.name.is_empty() {
            return Err(AtlasError::Config("database.name is required".to_string()));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    5
}

fn default_pool_timeout() -> u64 {
    30
}
