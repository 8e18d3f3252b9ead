//! Processor configuration
//!
//! The timing constants are protocol parameters shared by every guardian.
//! Overrides exist for devnets and tests.

use crate::error::{ProcessorError, ProcessorResult};
use std::env;
use std::time::Duration;

/// Cleanup pass period
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Age after which an unsettled record is settled or retried
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long settled records are kept before eviction
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Retransmissions of our own observation (~5 days at 30s)
pub const DEFAULT_MAX_OWN_RETRIES: u32 = 14_400;

/// Cleanup passes an unobserved record survives
pub const DEFAULT_MAX_UNOBSERVED_RETRIES: u32 = 10;

/// Capacity of each input channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Guardian sets kept for verifying finished VAAs
pub const DEFAULT_GUARDIAN_SET_HISTORY: usize = 2;

/// Configuration for the aggregation processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub cleanup_interval: Duration,
    pub settlement_timeout: Duration,
    /// Settled records are evicted at this age
    pub retention_window: Duration,
    pub max_own_retries: u32,
    pub max_unobserved_retries: u32,
    pub channel_capacity: usize,
    /// Number of guardian sets (including the active one) kept by index
    pub guardian_set_history: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
            retention_window: DEFAULT_RETENTION_WINDOW,
            max_own_retries: DEFAULT_MAX_OWN_RETRIES,
            max_unobserved_retries: DEFAULT_MAX_UNOBSERVED_RETRIES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            guardian_set_history: DEFAULT_GUARDIAN_SET_HISTORY,
        }
    }
}

impl ProcessorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GUARDIAN_CLEANUP_INTERVAL_SECS` (default: 30)
    /// - `GUARDIAN_SETTLEMENT_TIMEOUT_SECS` (default: 30)
    /// - `GUARDIAN_RETENTION_SECS` (default: 3600)
    /// - `GUARDIAN_MAX_OWN_RETRIES` (default: 14400)
    /// - `GUARDIAN_MAX_UNOBSERVED_RETRIES` (default: 10)
    /// - `GUARDIAN_CHANNEL_CAPACITY` (default: 1024)
    /// - `GUARDIAN_SET_HISTORY` (default: 2)
    ///
    /// Unparseable values fall back to the default; the result is validated.
    pub fn from_env() -> ProcessorResult<Self> {
        let defaults = Self::default();

        let config = Self {
            cleanup_interval: env_secs("GUARDIAN_CLEANUP_INTERVAL_SECS")
                .unwrap_or(defaults.cleanup_interval),
            settlement_timeout: env_secs("GUARDIAN_SETTLEMENT_TIMEOUT_SECS")
                .unwrap_or(defaults.settlement_timeout),
            retention_window: env_secs("GUARDIAN_RETENTION_SECS")
                .unwrap_or(defaults.retention_window),
            max_own_retries: env_parse("GUARDIAN_MAX_OWN_RETRIES")
                .unwrap_or(defaults.max_own_retries),
            max_unobserved_retries: env_parse("GUARDIAN_MAX_UNOBSERVED_RETRIES")
                .unwrap_or(defaults.max_unobserved_retries),
            channel_capacity: env_parse("GUARDIAN_CHANNEL_CAPACITY")
                .unwrap_or(defaults.channel_capacity),
            guardian_set_history: env_parse("GUARDIAN_SET_HISTORY")
                .unwrap_or(defaults.guardian_set_history),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ProcessorResult<()> {
        if self.cleanup_interval.is_zero() {
            return Err(invalid("cleanup_interval must be non-zero"));
        }
        if self.channel_capacity == 0 {
            return Err(invalid("channel_capacity must be non-zero"));
        }
        if self.guardian_set_history == 0 {
            return Err(invalid("guardian_set_history must keep at least the active set"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ProcessorError {
    ProcessorError::InvalidConfig {
        reason: reason.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();

        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
        assert_eq!(config.retention_window, Duration::from_secs(3600));
        assert_eq!(config.max_own_retries, 14_400);
        assert_eq!(config.max_unobserved_retries, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ProcessorConfig {
            cleanup_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProcessorError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = ProcessorConfig {
            guardian_set_history: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_override() {
        env::set_var("GUARDIAN_MAX_UNOBSERVED_RETRIES", "3");
        env::set_var("GUARDIAN_RETENTION_SECS", "not-a-number");

        let config = ProcessorConfig::from_env().unwrap();

        env::remove_var("GUARDIAN_MAX_UNOBSERVED_RETRIES");
        env::remove_var("GUARDIAN_RETENTION_SECS");

        assert_eq!(config.max_unobserved_retries, 3);
        assert_eq!(config.retention_window, DEFAULT_RETENTION_WINDOW);
    }
}
