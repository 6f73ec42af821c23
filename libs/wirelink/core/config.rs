use crate::error::{Result, WireError};
use std::time::Duration;

/// What the heartbeat sends on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeartbeatMode {
    /// Transport-level ping frame
    #[default]
    TransportPing,
    /// Application-level identity re-request (`getId`)
    IdentityRequest,
}

/// Configuration for a ConnectionSession
///
/// Defaults: read timeout 2m, write timeout 10s, ping interval 30s, ping
/// timeout 5s, handshake timeout 10s, heartbeat every 60s, inbound buffer of
/// 100 frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Endpoint URL (wss:// or ws://)
    pub url: String,
    pub handshake_timeout: Duration,
    /// Silence allowed on the read side before the transport is considered dead
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Minimum heartbeat interval
    pub ping_interval: Duration,
    /// Write deadline for pings and pongs
    pub ping_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_mode: HeartbeatMode,
    /// Capacity of the inbound frame queue
    pub inbound_buffer: usize,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handshake_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(60),
            heartbeat_mode: HeartbeatMode::TransportPing,
            inbound_buffer: 100,
        }
    }

    /// Heartbeat interval after applying the ping-interval floor
    pub fn effective_heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval.max(self.ping_interval)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(WireError::Configuration("endpoint URL is required".into()));
        }
        let timeouts = [
            ("handshake_timeout", self.handshake_timeout),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
            ("ping_interval", self.ping_interval),
            ("ping_timeout", self.ping_timeout),
            ("heartbeat_interval", self.heartbeat_interval),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, d)| d.is_zero()) {
            return Err(WireError::Configuration(format!("{} must be non-zero", name)));
        }
        if self.inbound_buffer == 0 {
            return Err(WireError::Configuration(
                "inbound_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("ws://localhost:9000");
        assert_eq!(config.read_timeout, Duration::from_secs(120));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.inbound_buffer, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_heartbeat_floor() {
        let mut config = SessionConfig::new("ws://localhost:9000");
        config.heartbeat_interval = Duration::from_secs(5);
        assert_eq!(config.effective_heartbeat_interval(), Duration::from_secs(30));
        config.heartbeat_interval = Duration::from_secs(90);
        assert_eq!(config.effective_heartbeat_interval(), Duration::from_secs(90));
    }

    #[test]
    fn test_validation() {
        assert!(SessionConfig::new("  ").validate().is_err());

        let mut config = SessionConfig::new("ws://localhost:9000");
        config.write_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::new("ws://localhost:9000");
        config.inbound_buffer = 0;
        assert!(config.validate().is_err());
    }
}
