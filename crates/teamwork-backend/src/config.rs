//! Backend configuration.
//!
//! Controls result caching, ancestor traversal, custom logic failure
//! handling and the resolution mode. Values come from `TEAMWORK_*`
//! environment variables, falling back to [`BackendConfig::default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// What to do when a custom permission logic hook fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Return the failure to the caller
    #[default]
    Propagate,

    /// Log the failure and treat the codename as not granted
    Deny,
}

impl HookFailurePolicy {
    /// Get the string representation of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Deny => "deny",
        }
    }

    /// Parse from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "propagate" | "raise" => Some(Self::Propagate),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// How grant sources are combined.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Nearest policy-bearing ancestor supplies policies. On each node,
    /// grants naming the principal (roles of the node's team, `users`,
    /// `groups`) take precedence over that node's `authenticated`/`anonymous`
    /// grants. Owner and custom logic grants are always added.
    #[default]
    Layered,

    /// Every source on the object and all its ancestors is unioned.
    Union,
}

impl ResolutionMode {
    /// Get the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Union => "union",
        }
    }

    /// Parse from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "layered" => Some(Self::Layered),
            "union" => Some(Self::Union),
            _ => None,
        }
    }
}

/// Permission backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Whether resolved permission sets are cached.
    pub cache_enabled: bool,

    /// Maximum number of cached (principal, object) entries.
    pub cache_capacity: usize,

    /// Maximum number of parent hops followed; `None` follows to the roots.
    pub max_ancestor_depth: Option<usize>,

    /// Handling of custom permission logic failures.
    pub hook_failure: HookFailurePolicy,

    /// How grant sources are combined.
    pub mode: ResolutionMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: 10_000,
            max_ancestor_depth: None,
            hook_failure: HookFailurePolicy::Propagate,
            mode: ResolutionMode::Layered,
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TEAMWORK_CACHE_ENABLED`: Cache resolved permissions (default: true)
    /// - `TEAMWORK_CACHE_CAPACITY`: Maximum cache entries (default: 10000)
    /// - `TEAMWORK_MAX_ANCESTOR_DEPTH`: Parent hops to follow (default: unlimited)
    /// - `TEAMWORK_HOOK_FAILURE`: `propagate` or `deny` (default: propagate)
    /// - `TEAMWORK_RESOLUTION_MODE`: `layered` or `union` (default: layered)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let cache_enabled = match lookup("TEAMWORK_CACHE_ENABLED") {
            Some(value) => parse_bool("TEAMWORK_CACHE_ENABLED", &value)?,
            None => default.cache_enabled,
        };

        let cache_capacity = match lookup("TEAMWORK_CACHE_CAPACITY") {
            Some(value) => value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "TEAMWORK_CACHE_CAPACITY".to_string(),
                message: format!("{}", e),
            })?,
            None => default.cache_capacity,
        };

        let max_ancestor_depth = match lookup("TEAMWORK_MAX_ANCESTOR_DEPTH") {
            Some(value) if value.trim().is_empty() || value.trim() == "none" => None,
            Some(value) => Some(value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "TEAMWORK_MAX_ANCESTOR_DEPTH".to_string(),
                message: format!("{}", e),
            })?),
            None => default.max_ancestor_depth,
        };

        let hook_failure = match lookup("TEAMWORK_HOOK_FAILURE") {
            Some(value) => HookFailurePolicy::parse(value.trim()).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "TEAMWORK_HOOK_FAILURE".to_string(),
                    message: format!("expected \"propagate\" or \"deny\", got {:?}", value),
                }
            })?,
            None => default.hook_failure,
        };

        let mode = match lookup("TEAMWORK_RESOLUTION_MODE") {
            Some(value) => ResolutionMode::parse(value.trim()).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "TEAMWORK_RESOLUTION_MODE".to_string(),
                    message: format!("expected \"layered\" or \"union\", got {:?}", value),
                }
            })?,
            None => default.mode,
        };

        let config = Self {
            cache_enabled,
            cache_capacity,
            max_ancestor_depth,
            hook_failure,
            mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_enabled && self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TEAMWORK_CACHE_CAPACITY".to_string(),
                message: "must be positive when caching is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// Disable caching (builder form).
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Set the resolution mode (builder form).
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the hook failure policy (builder form).
    pub fn with_hook_failure(mut self, hook_failure: HookFailurePolicy) -> Self {
        self.hook_failure = hook_failure;
        self
    }

    /// Limit ancestor traversal (builder form).
    pub fn with_max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = Some(depth);
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {:?}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.max_ancestor_depth, None);
        assert_eq!(config.hook_failure, HookFailurePolicy::Propagate);
        assert_eq!(config.mode, ResolutionMode::Layered);
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = BackendConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BackendConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("TEAMWORK_CACHE_ENABLED", "false"),
            ("TEAMWORK_CACHE_CAPACITY", "0"),
            ("TEAMWORK_MAX_ANCESTOR_DEPTH", "3"),
            ("TEAMWORK_HOOK_FAILURE", "Deny"),
            ("TEAMWORK_RESOLUTION_MODE", "union"),
        ]))
        .unwrap();

        assert!(!config.cache_enabled);
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.max_ancestor_depth, Some(3));
        assert_eq!(config.hook_failure, HookFailurePolicy::Deny);
        assert_eq!(config.mode, ResolutionMode::Union);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = BackendConfig::from_lookup(lookup(&[("TEAMWORK_CACHE_ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("TEAMWORK_CACHE_ENABLED"));

        assert!(
            BackendConfig::from_lookup(lookup(&[("TEAMWORK_HOOK_FAILURE", "ignore")])).is_err()
        );
        assert!(
            BackendConfig::from_lookup(lookup(&[("TEAMWORK_MAX_ANCESTOR_DEPTH", "-1")])).is_err()
        );
    }

    #[test]
    fn test_validate_capacity() {
        let mut config = BackendConfig::default();
        config.cache_capacity = 0;
        assert!(config.validate().is_err());

        assert!(config.without_cache().validate().is_ok());
    }
}
