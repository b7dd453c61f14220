//! Harness configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::params::MAX_SIMULTANEOUS_USERS;

/// Tunables for parameter derivation and phase execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Identity placed in every functional parameter map
    #[serde(default = "default_user")]
    pub default_user: String,

    /// Item count of the functional phase
    #[serde(default = "default_functional_items")]
    pub functional_items: u64,

    /// Item count (upper bound on calls) of the performance phase
    #[serde(default = "default_performance_items")]
    pub performance_items: u64,

    /// Smallest simulated user count (inclusive)
    #[serde(default = "default_min_users")]
    pub min_users: u64,

    /// Largest simulated user count (inclusive)
    #[serde(default = "default_max_users")]
    pub max_users: u64,

    /// Run exactly `items` calls instead of a random count below it
    #[serde(default)]
    pub fixed_iterations: bool,

    /// Seed for user and iteration counts; random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Give up on a simulated user after this many milliseconds
    #[serde(default)]
    pub user_timeout_ms: Option<u64>,

    /// Wait for queued probe increments before reporting a phase's delta
    #[serde(default = "default_true")]
    pub flush_probes: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            functional_items: default_functional_items(),
            performance_items: default_performance_items(),
            min_users: default_min_users(),
            max_users: default_max_users(),
            fixed_iterations: false,
            seed: None,
            user_timeout_ms: None,
            flush_probes: true,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> HarnessResult<()> {
        if self.min_users < 2 {
            return Err(HarnessError::Config(format!(
                "min_users must be at least 2, got {}",
                self.min_users
            )));
        }
        if self.min_users > self.max_users {
            return Err(HarnessError::Config(format!(
                "min_users ({}) exceeds max_users ({})",
                self.min_users, self.max_users
            )));
        }
        if self.max_users > MAX_SIMULTANEOUS_USERS {
            return Err(HarnessError::Config(format!(
                "max_users ({}) exceeds {}",
                self.max_users, MAX_SIMULTANEOUS_USERS
            )));
        }
        if self.user_timeout_ms == Some(0) {
            return Err(HarnessError::Config("user_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn user_timeout(&self) -> Option<Duration> {
        self.user_timeout_ms.map(Duration::from_millis)
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_user() -> String {
    "user".to_string()
}

fn default_functional_items() -> u64 {
    20
}

fn default_performance_items() -> u64 {
    50
}

fn default_min_users() -> u64 {
    2
}

fn default_max_users() -> u64 {
    11
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.default_user, "user");
        assert_eq!(config.functional_items, 20);
        assert_eq!(config.performance_items, 50);
        assert_eq!((config.min_users, config.max_users), (2, 11));
        assert!(config.flush_probes);
        assert!(config.user_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{"max_users": 4, "user_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.max_users, 4);
        assert_eq!(config.min_users, 2);
        assert_eq!(config.user_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validation() {
        let config = HarnessConfig {
            min_users: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));

        let config = HarnessConfig {
            min_users: 6,
            max_users: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HarnessConfig {
            max_users: MAX_SIMULTANEOUS_USERS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HarnessConfig {
            user_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
