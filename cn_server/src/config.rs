//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use codenames::{db::DatabaseConfig, hub::HubConfig};
use std::{
    net::{Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

/// Bind address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    8080,
);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Word pool database; `None` keeps the word pool in memory
    pub database: Option<DatabaseConfig>,
    /// Broadcast hub queues and heartbeat timing
    pub hub: HubConfig,
    /// Prometheus listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_var(&lookup, "SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let database = database_url_override
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(|url| -> Result<DatabaseConfig, ConfigError> {
                let defaults = DatabaseConfig::with_url(url);
                Ok(DatabaseConfig {
                    max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS")?
                        .unwrap_or(defaults.max_connections),
                    min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS")?
                        .unwrap_or(defaults.min_connections),
                    connection_timeout: secs_var(&lookup, "DB_CONNECTION_TIMEOUT_SECS")?
                        .unwrap_or(defaults.connection_timeout),
                    idle_timeout: secs_var(&lookup, "DB_IDLE_TIMEOUT_SECS")?
                        .unwrap_or(defaults.idle_timeout),
                    max_lifetime: secs_var(&lookup, "DB_MAX_LIFETIME_SECS")?
                        .unwrap_or(defaults.max_lifetime),
                    ..defaults
                })
            })
            .transpose()?;

        let hub_defaults = HubConfig::default();
        let pong_wait =
            secs_var(&lookup, "WS_PONG_WAIT_SECS")?.unwrap_or(hub_defaults.pong_wait);
        let hub = HubConfig {
            queue_capacity: parse_var(&lookup, "HUB_QUEUE_CAPACITY")?
                .unwrap_or(hub_defaults.queue_capacity),
            control_capacity: parse_var(&lookup, "HUB_CONTROL_CAPACITY")?
                .unwrap_or(hub_defaults.control_capacity),
            write_wait: secs_var(&lookup, "WS_WRITE_WAIT_SECS")?
                .unwrap_or(hub_defaults.write_wait),
            pong_wait,
            ping_period: HubConfig::ping_period_for(pong_wait),
        };

        let metrics_bind = parse_var(&lookup, "METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            hub,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hub.validate().map_err(|reason| ConfigError::Invalid {
            var: "HUB_*/WS_*".to_string(),
            reason,
        })?;

        if let Some(database) = &self.database {
            database.validate().map_err(|reason| ConfigError::Invalid {
                var: "DATABASE_URL/DB_*".to_string(),
                reason,
            })?;
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parses `key` if it is set. Unset or blank values yield `None`; values
/// that fail to parse are reported rather than silently replaced.
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

fn secs_var<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_var::<u64, F>(lookup, key)?.map(Duration::from_secs))
}
