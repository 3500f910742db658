//! Configuration module for the measurement engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between recurring health checks (default: 300s)
    pub monitor_interval: Duration,
    /// Client tag sent as the User-Agent of every probe request, so the
    /// probed server can identify the engine in its request log
    pub client_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(300),
            client_tag: "apipulse-probe/0.1".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `APIPULSE_MONITOR_INTERVAL_SECS`: health check interval in seconds (default: 300)
    /// - `APIPULSE_CLIENT_TAG`: User-Agent for probe requests (default: "apipulse-probe/0.1")
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(secs_str) = env::var("APIPULSE_MONITOR_INTERVAL_SECS") {
            if let Ok(secs) = secs_str.parse() {
                cfg.monitor_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(tag) = env::var("APIPULSE_CLIENT_TAG") {
            cfg.client_tag = tag;
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.monitor_interval, Duration::from_secs(300));
        assert_eq!(cfg.client_tag, "apipulse-probe/0.1");
    }
}
