//! Agent configuration.
//!
//! Built once at startup (normally by the CLI) and never mutated afterwards.

use std::time::Duration;

use crate::error::{AgentError, Result};

/// Default miner API address.
pub const DEFAULT_CLAYMORE_ADDR: &str = "127.0.0.1:3333";
/// Default bind host for the health endpoint.
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
/// Default port for the health endpoint.
pub const DEFAULT_HTTP_PORT: u16 = 8085;
/// Default InfluxDB endpoint.
pub const DEFAULT_INFLUX_ADDR: &str = "http://127.0.0.1:8086";
/// Default InfluxDB database.
pub const DEFAULT_INFLUX_DATABASE: &str = "homelab_custom";
/// Default poll interval in seconds.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 20;

/// How the poll loop spaces its cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cadence {
    /// Sleep for the full interval after each cycle finishes. Drifts by the
    /// duration of each cycle.
    #[default]
    FixedDelay,
    /// Start cycles on a fixed monotonic schedule measured from cycle start.
    FixedRate,
}

/// Time-series sink connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Base URL of the InfluxDB HTTP API, e.g. `http://127.0.0.1:8086`.
    pub addr: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_INFLUX_ADDR.to_string(),
            database: DEFAULT_INFLUX_DATABASE.to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Full agent configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// `host:port` of the Claymore remote management API.
    pub claymore_addr: String,
    pub http_host: String,
    pub http_port: u16,
    pub sink: SinkConfig,
    pub interval: Duration,
    pub cadence: Cadence,
    /// Terminate the process on the first failed sink write instead of
    /// logging and continuing.
    pub exit_on_sink_error: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            claymore_addr: DEFAULT_CLAYMORE_ADDR.to_string(),
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            sink: SinkConfig::default(),
            interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            cadence: Cadence::default(),
            exit_on_sink_error: false,
        }
    }
}

impl AgentConfig {
    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(invalid("poll interval must be at least one second"));
        }
        if self.claymore_addr.trim().is_empty() {
            return Err(invalid("claymore address is empty"));
        }
        if self.sink.addr.trim().is_empty() {
            return Err(invalid("influxdb address is empty"));
        }
        if self.sink.database.trim().is_empty() {
            return Err(invalid("influxdb database is empty"));
        }
        Ok(())
    }

    /// `host:port` the health endpoint binds to.
    pub fn health_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn invalid(reason: &str) -> AgentError {
    AgentError::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_agent_flags() {
        let config = AgentConfig::default();
        assert_eq!(config.claymore_addr, "127.0.0.1:3333");
        assert_eq!(config.http_port, 8085);
        assert_eq!(config.sink.addr, "http://127.0.0.1:8086");
        assert_eq!(config.sink.database, "homelab_custom");
        assert_eq!(config.interval, Duration::from_secs(20));
        assert_eq!(config.cadence, Cadence::FixedDelay);
        assert!(!config.exit_on_sink_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = AgentConfig {
            interval: Duration::ZERO,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AgentError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_sink_database_rejected() {
        let mut config = AgentConfig::default();
        config.sink.database = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_health_bind_addr() {
        let config = AgentConfig {
            http_host: "127.0.0.1".to_string(),
            http_port: 9000,
            ..AgentConfig::default()
        };
        assert_eq!(config.health_bind_addr(), "127.0.0.1:9000");
    }
}
