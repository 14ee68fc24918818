//! Server and session configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Longest accepted turn timeout or rematch window: one day.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// How turn deadlines and the rematch window are enforced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimerMode {
    /// A server-owned timer fires at each deadline, even with no client traffic.
    #[default]
    Proactive,
    /// Deadlines are only checked when the next message arrives.
    Reactive,
}

/// How a client's `turnTimeout` report is treated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClientTimeoutPolicy {
    /// The report only prompts a check of the server's own deadline.
    #[default]
    Advisory,
    /// The report forfeits the active seat immediately.
    Trusted,
}

/// Rules and limits for a match session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct SessionConfig {
    /// Seconds a seat has to make its move.
    #[serde(default = "default_turn_timeout_secs")]
    turn_timeout_secs: u64,

    /// Seconds both seats have to vote for a rematch, counted from the first vote.
    #[serde(default = "default_rematch_window_secs")]
    rematch_window_secs: u64,

    /// Deadline enforcement mode.
    #[serde(default)]
    timer_mode: TimerMode,

    /// Treatment of client-reported turn timeouts.
    #[serde(default)]
    client_timeout: ClientTimeoutPolicy,

    /// Longest accepted chat message, in characters.
    #[serde(default = "default_max_chat_len")]
    max_chat_len: usize,
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_rematch_window_secs() -> u64 {
    30
}

fn default_max_chat_len() -> usize {
    500
}

impl SessionConfig {
    /// Turn timeout as a duration, capped at [`MAX_TIMEOUT_SECS`].
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs.min(MAX_TIMEOUT_SECS))
    }

    /// Rematch window as a duration, capped at [`MAX_TIMEOUT_SECS`].
    pub fn rematch_window(&self) -> Duration {
        Duration::from_secs(self.rematch_window_secs.min(MAX_TIMEOUT_SECS))
    }

    /// Checks that both time limits are within [`MAX_TIMEOUT_SECS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("turn_timeout_secs", self.turn_timeout_secs),
            ("rematch_window_secs", self.rematch_window_secs),
        ] {
            if secs > MAX_TIMEOUT_SECS {
                return Err(ConfigError::new(format!(
                    "{} = {} exceeds the limit of {} seconds",
                    name, secs, MAX_TIMEOUT_SECS
                )));
            }
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout_secs(),
            rematch_window_secs: default_rematch_window_secs(),
            timer_mode: TimerMode::default(),
            client_timeout: ClientTimeoutPolicy::default(),
            max_chat_len: default_max_chat_len(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Session rules.
    #[serde(default)]
    session: SessionConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take their defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(
            host = %config.host,
            port = config.port,
            timer_mode = %config.session.timer_mode,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses configuration from TOML text and validates the session limits.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.session.validate()?;
        Ok(config)
    }

    /// Address to bind, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.session().turn_timeout(), Duration::from_secs(30));
        assert_eq!(config.session().rematch_window(), Duration::from_secs(30));
        assert_eq!(*config.session().timer_mode(), TimerMode::Proactive);
        assert_eq!(
            *config.session().client_timeout(),
            ClientTimeoutPolicy::Advisory
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ServerConfig::from_toml(
            r#"
            port = 9001

            [session]
            rematch_window_secs = 10
            timer_mode = "reactive"
            client_timeout = "trusted"
            "#,
        )
        .unwrap();

        assert_eq!(*config.port(), 9001);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.session().rematch_window_secs(), 10);
        assert_eq!(*config.session().turn_timeout_secs(), 30);
        assert_eq!(*config.session().timer_mode(), TimerMode::Reactive);
        assert_eq!(
            *config.session().client_timeout(),
            ClientTimeoutPolicy::Trusted
        );
    }

    #[test]
    fn test_bad_toml_reports_location() {
        let err = ServerConfig::from_toml("port = \"not a number\"").unwrap_err();
        assert!(err.message.starts_with("Failed to parse config"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let err = ServerConfig::from_toml("[session]\nturn_timeout_secs = 9223372036854775807")
            .unwrap_err();
        assert!(err.message.starts_with("turn_timeout_secs"));

        let err = ServerConfig::from_toml("[session]\nrematch_window_secs = 86401").unwrap_err();
        assert!(err.message.starts_with("rematch_window_secs"));

        assert!(ServerConfig::from_toml("[session]\nrematch_window_secs = 86400").is_ok());
    }

    #[test]
    fn test_durations_capped_when_set_in_code() {
        let session = SessionConfig::default().with_turn_timeout_secs(u64::MAX);
        assert_eq!(session.turn_timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_setters_chain() {
        let session = SessionConfig::default()
            .with_turn_timeout_secs(5)
            .with_timer_mode(TimerMode::Reactive);
        assert_eq!(session.turn_timeout(), Duration::from_secs(5));
        assert_eq!(session.timer_mode().to_string(), "reactive");
    }
}
