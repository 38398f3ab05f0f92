use std::time::Duration;

use crate::error::BridgeError;

#[derive(Clone, Copy, Debug)]
pub struct BridgeConfig {
    /// Fallback timeout used when `send_request` does not carry one.
    pub default_timeout_ms: u64,
    /// Interval between outbound keep-alive notifications. The liveness
    /// window is twice this value.
    pub heartbeat_interval_ms: u64,
    /// Interval between host-side state-refresh notifications.
    pub sync_interval_ms: u64,
    /// Reserved; not consulted by the timeout logic.
    pub max_retries: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            heartbeat_interval_ms: 5_000,
            sync_interval_ms: 30_000,
            max_retries: 0,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        let err = |msg: &str| Err(BridgeError::InvalidConfig(msg.into()));

        if self.default_timeout_ms == 0 {
            return err("default_timeout_ms must be > 0");
        }
        if self.heartbeat_interval_ms == 0 {
            return err("heartbeat_interval_ms must be > 0");
        }
        if self.sync_interval_ms == 0 {
            return err("sync_interval_ms must be > 0");
        }

        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = BridgeConfig::default();

        config.default_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.default_timeout_ms = 10_000;

        config.heartbeat_interval_ms = 0;
        assert!(config.validate().is_err());
        config.heartbeat_interval_ms = 5_000;

        config.sync_interval_ms = 0;
        assert!(config.validate().is_err());
        config.sync_interval_ms = 30_000;

        // max_retries is reserved, any value passes
        config.max_retries = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_accessors() {
        let config = BridgeConfig::default();
        assert_eq!(config.default_timeout(), Duration::from_secs(10));
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.sync_interval(), Duration::from_secs(30));
    }
}
