use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use wirelink::{BackoffSchedule, HeartbeatMode, Rate, RateLimiter, SessionConfig, WaitPolicy};

/// Environment variable overriding `websocket.url`
pub const WS_URL_ENV: &str = "HERMIT_WS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid environment variable {0}")]
    EnvVarInvalid(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Hermit configuration (`configs/config.yml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HermitConfig {
    pub bot: BotSettings,
    pub websocket: WebSocketSettings,
    #[serde(default)]
    pub logger: LoggerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Marks a chat message as a command, e.g. `$`
    pub prefix: String,
    /// Prepended to every reply
    pub response_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketSettings {
    pub url: String,
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default)]
    pub heartbeat_mode: HeartbeatModeSetting,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: usize,
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,
}

/// Heartbeat probe (`ping` or `identity`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatModeSetting {
    #[default]
    Ping,
    Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_use_colors")]
    pub use_colors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Sleep for a token instead of rejecting
    #[serde(default = "default_wait_for_tokens")]
    pub wait_for_tokens: bool,
    #[serde(default = "default_global_rate")]
    pub global: Rate,
    /// Per-action rates, keyed by route (`sendMessage`, `getId`)
    #[serde(default)]
    pub routes: HashMap<String, Rate>,
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    120
}

fn default_write_timeout() -> u64 {
    10
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    5
}

fn default_heartbeat_interval() -> u64 {
    60
}

fn default_max_reconnect_attempts() -> usize {
    wirelink::reconnect::DEFAULT_MAX_ATTEMPTS
}

fn default_inbound_buffer() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_use_colors() -> bool {
    true
}

fn default_wait_for_tokens() -> bool {
    true
}

fn default_global_rate() -> Rate {
    Rate {
        limit: 10.0,
        burst: 10,
        window: Duration::from_secs(1),
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            use_colors: default_use_colors(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wait_for_tokens: default_wait_for_tokens(),
            global: default_global_rate(),
            routes: HashMap::new(),
        }
    }
}

impl HermitConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::parse(&yaml_content)?;

        // Load .env file
        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without touching the environment or validating
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(WS_URL_ENV) {
            if url.trim().is_empty() {
                return Err(ConfigError::EnvVarInvalid(format!("{} is empty", WS_URL_ENV)));
            }
            info!("Overriding websocket URL from environment variable");
            self.websocket.url = url;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.bot.prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "bot.prefix must not be empty".to_string(),
            ));
        }

        let url = self.websocket.url.trim();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "websocket.url must start with ws:// or wss://, got '{}'",
                self.websocket.url
            )));
        }

        let ws = &self.websocket;
        let timeouts = [
            ("handshake_timeout_secs", ws.handshake_timeout_secs),
            ("read_timeout_secs", ws.read_timeout_secs),
            ("write_timeout_secs", ws.write_timeout_secs),
            ("ping_interval_secs", ws.ping_interval_secs),
            ("ping_timeout_secs", ws.ping_timeout_secs),
            ("heartbeat_interval_secs", ws.heartbeat_interval_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "websocket.{} must be greater than 0",
                    name
                )));
            }
        }

        if ws.inbound_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "websocket.inbound_buffer must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logger.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logger.level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        // Rates are checked even when disabled so a later toggle cannot fail
        self.rate_limit
            .global
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("rate_limit.global: {}", e)))?;
        for (route, rate) in &self.rate_limit.routes {
            rate.validate().map_err(|e| {
                ConfigError::ValidationError(format!("rate_limit.routes.{}: {}", route, e))
            })?;
        }

        Ok(())
    }

    /// Session settings for wirelink
    pub fn session_config(&self) -> SessionConfig {
        let ws = &self.websocket;
        let mut config = SessionConfig::new(ws.url.clone());
        config.handshake_timeout = Duration::from_secs(ws.handshake_timeout_secs);
        config.read_timeout = Duration::from_secs(ws.read_timeout_secs);
        config.write_timeout = Duration::from_secs(ws.write_timeout_secs);
        config.ping_interval = Duration::from_secs(ws.ping_interval_secs);
        config.ping_timeout = Duration::from_secs(ws.ping_timeout_secs);
        config.heartbeat_interval = Duration::from_secs(ws.heartbeat_interval_secs);
        config.heartbeat_mode = match ws.heartbeat_mode {
            HeartbeatModeSetting::Ping => HeartbeatMode::TransportPing,
            HeartbeatModeSetting::Identity => HeartbeatMode::IdentityRequest,
        };
        config.inbound_buffer = ws.inbound_buffer;
        config
    }

    /// Standard backoff table with the configured attempt budget
    pub fn reconnect_strategy(&self) -> BackoffSchedule {
        BackoffSchedule::with_max_attempts(self.websocket.max_reconnect_attempts)
    }

    /// The configured limiter, `None` when rate limiting is disabled
    pub fn rate_limiter(&self) -> Result<Option<RateLimiter>> {
        if !self.rate_limit.enabled {
            return Ok(None);
        }
        let policy = if self.rate_limit.wait_for_tokens {
            WaitPolicy::Wait
        } else {
            WaitPolicy::Reject
        };
        let routes = self
            .rate_limit
            .routes
            .iter()
            .map(|(route, rate)| (route.clone(), *rate));
        RateLimiter::from_rates(self.rate_limit.global, routes, policy)
            .map(Some)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Log configuration summary
    pub fn log(&self) {
        let ws = &self.websocket;
        info!("Configuration loaded:");
        info!("  Command prefix: {}", self.bot.prefix);
        info!("  Response prefix: {}", self.bot.response_prefix);
        info!("  Endpoint: {}", ws.url);
        info!(
            "  Timeouts: handshake {}s, read {}s, write {}s, ping {}s",
            ws.handshake_timeout_secs,
            ws.read_timeout_secs,
            ws.write_timeout_secs,
            ws.ping_timeout_secs
        );
        info!(
            "  Heartbeat: every {}s ({:?}), ping interval {}s",
            ws.heartbeat_interval_secs, ws.heartbeat_mode, ws.ping_interval_secs
        );
        info!("  Max reconnect attempts: {}", ws.max_reconnect_attempts);
        info!("  Inbound buffer: {}", ws.inbound_buffer);
        info!("  Log level: {}", self.logger.level);
        if self.rate_limit.enabled {
            info!(
                "  Rate limit: {} per {:?} (burst {}), {} route override(s), {}",
                self.rate_limit.global.limit,
                self.rate_limit.global.window,
                self.rate_limit.global.burst,
                self.rate_limit.routes.len(),
                if self.rate_limit.wait_for_tokens { "wait" } else { "reject" }
            );
        } else {
            info!("  Rate limit: disabled");
        }
    }
}
