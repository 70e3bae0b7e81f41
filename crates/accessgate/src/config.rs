//! Access control configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development.

use serde::{Deserialize, Serialize};

/// Configuration for an [`AccessControl`](crate::AccessControl) instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Lock the grants right after a non-empty bulk load.
    pub lock_on_load: bool,

    /// Emit every permission decision at `info` level instead of `debug`.
    pub log_decisions: bool,
}

impl AccessControlConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ACCESSGATE_LOCK_ON_LOAD`: lock after bulk loads (default: false)
    /// - `ACCESSGATE_LOG_DECISIONS`: log permission decisions at info level (default: false)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            lock_on_load: std::env::var("ACCESSGATE_LOCK_ON_LOAD")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.lock_on_load),
            log_decisions: std::env::var("ACCESSGATE_LOG_DECISIONS")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.log_decisions),
        }
    }

    /// Set `lock_on_load`.
    pub fn with_lock_on_load(mut self, lock_on_load: bool) -> Self {
        self.lock_on_load = lock_on_load;
        self
    }

    /// Set `log_decisions`.
    pub fn with_log_decisions(mut self, log_decisions: bool) -> Self {
        self.log_decisions = log_decisions;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AccessControlConfig::default();
        assert!(!config.lock_on_load);
        assert!(!config.log_decisions);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" ON "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_builder_methods() {
        let config = AccessControlConfig::default()
            .with_lock_on_load(true)
            .with_log_decisions(true);
        assert!(config.lock_on_load);
        assert!(config.log_decisions);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AccessControlConfig =
            serde_json::from_str(r#"{ "log_decisions": true }"#).unwrap();
        assert!(config.log_decisions);
        assert!(!config.lock_on_load);
    }
}
