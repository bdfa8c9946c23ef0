//! Configuration management for cogbot.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{AppState, SecurityConfig, ServerConfig};
use crate::cli::Args;
use crate::conversation::DEFAULT_STEP_TIMEOUT;
use crate::security::{AuthConfig, CooldownConfig};
use crate::session::SessionTimings;
use crate::settings::JsonFileBackend;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub security: SecuritySection,
    pub sessions: SessionsSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub auth: AuthSection,
    pub cooldown: CooldownSection,
}

/// Relay authentication. Off by default so a fresh checkout runs locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub enabled: bool,
    pub relay_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSection {
    pub enabled: bool,
    /// Commands a user may start per window.
    pub uses: u32,
    pub window_secs: u64,
}

impl CooldownSection {
    /// A zero limit would refuse every command; a zero window would never
    /// refuse one. Use `enabled: false` to switch cooldowns off instead.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.uses == 0 {
            return Err(ConfigError::ZeroCooldown("uses"));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::ZeroCooldown("window_secs"));
        }
        Ok(())
    }
}

impl Default for CooldownSection {
    fn default() -> Self {
        let defaults = CooldownConfig::default();
        Self {
            enabled: defaults.enabled,
            uses: defaults.uses,
            window_secs: defaults.window.as_secs(),
        }
    }
}

/// Idle timeouts, all in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    pub pages_idle_secs: u64,
    pub help_idle_secs: u64,
    pub tictactoe_idle_secs: u64,
    pub memory_idle_secs: u64,
    pub password_idle_secs: u64,
    pub memory_reveal_secs: u64,
    pub memory_mismatch_secs: u64,
    /// How long a conversation waits for each reply.
    pub wizard_timeout_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        let t = SessionTimings::default();
        Self {
            pages_idle_secs: t.pages_idle.as_secs(),
            help_idle_secs: t.help_idle.as_secs(),
            tictactoe_idle_secs: t.tictactoe_idle.as_secs(),
            memory_idle_secs: t.memory_idle.as_secs(),
            password_idle_secs: t.password_idle.as_secs(),
            memory_reveal_secs: t.memory_reveal.as_secs(),
            memory_mismatch_secs: t.memory_mismatch.as_secs(),
            wizard_timeout_secs: DEFAULT_STEP_TIMEOUT.as_secs(),
        }
    }
}

impl SessionsSection {
    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            pages_idle: Duration::from_secs(self.pages_idle_secs),
            help_idle: Duration::from_secs(self.help_idle_secs),
            tictactoe_idle: Duration::from_secs(self.tictactoe_idle_secs),
            memory_idle: Duration::from_secs(self.memory_idle_secs),
            password_idle: Duration::from_secs(self.password_idle_secs),
            memory_reveal: Duration::from_secs(self.memory_reveal_secs),
            memory_mismatch: Duration::from_secs(self.memory_mismatch_secs),
        }
    }

    pub fn wizard_timeout(&self) -> Duration {
        Duration::from_secs(self.wizard_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("pages_idle_secs", self.pages_idle_secs),
            ("help_idle_secs", self.help_idle_secs),
            ("tictactoe_idle_secs", self.tictactoe_idle_secs),
            ("memory_idle_secs", self.memory_idle_secs),
            ("password_idle_secs", self.password_idle_secs),
            ("wizard_timeout_secs", self.wizard_timeout_secs),
        ];
        match fields.iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(ConfigError::ZeroTimeout(*name)),
            None => Ok(()),
        }
    }
}

/// Where guild settings live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/guilds"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or full `EnvFilter` directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("COGBOT_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("COGBOT_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(key) = var("COGBOT_RELAY_KEY").filter(|k| !k.is_empty()) {
            self.add_relay_key(key);
        }

        if let Some(dir) = var("COGBOT_DATA_DIR").filter(|d| !d.is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(level) = var("COGBOT_LOG_LEVEL").or_else(|| var("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    fn add_relay_key(&mut self, key: String) {
        self.security.auth.enabled = true;
        if !self.security.auth.relay_keys.contains(&key) {
            self.security.auth.relay_keys.push(key);
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref key) = args.relay_key {
            self.add_relay_key(key.clone());
        }

        if args.no_auth {
            self.security.auth.enabled = false;
        }

        if args.no_cooldown {
            self.security.cooldown.enabled = false;
        }

        if let Some(ref dir) = args.data_dir {
            self.storage.data_dir = dir.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);
        config.sessions.validate()?;
        config.security.cooldown.validate()?;

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }
        Ok(server_config)
    }

    pub fn to_security_config(&self) -> SecurityConfig {
        let cooldown = &self.security.cooldown;
        let mut security = SecurityConfig {
            auth: AuthConfig {
                enabled: self.security.auth.enabled,
                ..AuthConfig::default()
            },
            relay_keys: Vec::new(),
            cooldown: CooldownConfig {
                enabled: cooldown.enabled,
                ..CooldownConfig::custom(cooldown.uses, cooldown.window_secs)
            },
        };
        for key in &self.security.auth.relay_keys {
            security = security.with_relay_key(key);
        }
        security
    }

    /// Build the shared server state, opening the settings directory.
    pub fn build_state(&self) -> Result<AppState, ConfigError> {
        if self.security.auth.enabled && self.security.auth.relay_keys.is_empty() {
            return Err(ConfigError::MissingRelayKey);
        }

        let backend = JsonFileBackend::new(&self.storage.data_dir)
            .map_err(|e| ConfigError::Storage {
                path: self.storage.data_dir.clone(),
                reason: e.to_string(),
            })?;

        Ok(AppState::from_parts(
            &self.to_security_config(),
            self.sessions.timings(),
            self.sessions.wizard_timeout(),
            Arc::new(backend),
        ))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(serde_json::Error),

    #[error("invalid host address: {0}")]
    InvalidHost(String),

    #[error("sessions.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("security.cooldown.{0} must be greater than zero while cooldowns are enabled")]
    ZeroCooldown(&'static str),

    #[error("relay authentication is enabled but no relay key is configured")]
    MissingRelayKey,

    #[error("cannot open settings directory {path:?}: {reason}")]
    Storage { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(!config.security.auth.enabled);
        assert!(config.security.cooldown.enabled);
        assert_eq!(config.security.cooldown.uses, 3);
        assert_eq!(config.sessions.pages_idle_secs, 180);
        assert_eq!(config.sessions.wizard_timeout_secs, 120);
        assert_eq!(config.sessions.timings(), SessionTimings::default());
    }

    #[test]
    fn test_config_from_json() {
        let file = write_config(
            r#"{
                "server": { "host": "0.0.0.0", "port": 8080 },
                "security": {
                    "auth": { "enabled": true, "relay_keys": ["key1", "key2"] },
                    "cooldown": { "uses": 5, "window_secs": 30 }
                },
                "sessions": { "tictactoe_idle_secs": 90 }
            }"#,
        );

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.security.auth.enabled);
        assert_eq!(config.security.auth.relay_keys.len(), 2);
        assert_eq!(config.security.cooldown.uses, 5);
        assert!(config.security.cooldown.enabled);
        assert_eq!(
            config.sessions.timings().tictactoe_idle,
            Duration::from_secs(90)
        );
        assert_eq!(config.sessions.memory_idle_secs, 120);
    }

    #[test]
    fn test_config_bad_json() {
        let file = write_config("{ \"server\": ");
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COGBOT_PORT", "4100"),
            ("COGBOT_RELAY_KEY", "cb_env"),
            ("COGBOT_DATA_DIR", "/var/lib/cogbot"),
            ("RUST_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 4100);
        assert!(config.security.auth.enabled);
        assert_eq!(config.security.auth.relay_keys, vec!["cb_env".to_string()]);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/cogbot"));
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_env_log_level_beats_rust_log() {
        let mut config = Config::default();
        config.apply_vars(|name| match name {
            "COGBOT_LOG_LEVEL" => Some("warn".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            relay_key: Some("test-key".to_string()),
            no_cooldown: true,
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert!(config.security.auth.enabled);
        assert!(config
            .security
            .auth
            .relay_keys
            .contains(&"test-key".to_string()));
        assert!(!config.security.cooldown.enabled);
    }

    #[test]
    fn test_args_keep_file_values_when_absent() {
        let mut config = Config::default();
        config.server.port = 7000;
        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_apply_no_auth() {
        let mut config = Config::default();
        config.security.auth.enabled = true;

        let args = Args {
            no_auth: true,
            ..Args::default()
        };

        config.apply_args(&args);
        assert!(!config.security.auth.enabled);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_config(r#"{ "sessions": { "help_idle_secs": 0 } }"#);
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        let err = Config::load(&args).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout("help_idle_secs")));
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        for (json, field) in [
            (r#"{ "security": { "cooldown": { "uses": 0 } } }"#, "uses"),
            (r#"{ "security": { "cooldown": { "window_secs": 0 } } }"#, "window_secs"),
        ] {
            let file = write_config(json);
            let args = Args {
                config: Some(file.path().to_path_buf()),
                ..Args::default()
            };
            let err = Config::load(&args).unwrap_err();
            assert!(matches!(err, ConfigError::ZeroCooldown(f) if f == field));
        }
    }

    #[test]
    fn test_zero_cooldown_allowed_when_disabled() {
        let file = write_config(r#"{ "security": { "cooldown": { "uses": 0, "window_secs": 0 } } }"#);
        let args = Args {
            config: Some(file.path().to_path_buf()),
            no_cooldown: true,
            ..Args::default()
        };
        let config = Config::load(&args).unwrap();
        assert!(!config.security.cooldown.enabled);
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 3000);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert!(matches!(
            config.to_server_config(),
            Err(ConfigError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_security_config() {
        let mut config = Config::default();
        config.add_relay_key("cb_one".to_string());
        config.security.cooldown.enabled = false;
        config.security.cooldown.uses = 7;

        let security = config.to_security_config();
        assert!(security.auth.enabled);
        assert_eq!(security.relay_keys, vec!["cb_one".to_string()]);
        assert!(!security.cooldown.enabled);
        assert_eq!(security.cooldown.uses, 7);
    }

    #[test]
    fn test_build_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("guilds");
        config.add_relay_key("cb_state".to_string());

        let state = config.build_state().unwrap();
        assert!(state.auth.is_enabled());
        assert!(state.auth.is_valid("cb_state"));
        assert_eq!(state.sessions.count(), 0);
    }

    #[test]
    fn test_build_state_requires_key() {
        let mut config = Config::default();
        config.security.auth.enabled = true;
        assert!(matches!(
            config.build_state(),
            Err(ConfigError::MissingRelayKey)
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"relay_keys\""));
        assert!(json.contains("\"wizard_timeout_secs\""));
        assert!(json.contains("\"data_dir\""));
    }
}
