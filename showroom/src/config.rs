//! Configuration Management for the Showroom
//!
//! Environment-based configuration with validation.
//!
//! # Example
//!
//! ```no_run
//! use showroom::config::{Environment, ShowroomConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from CONFIG_ENV (defaults to development) plus SHOWROOM_* overrides
//! let config = ShowroomConfig::from_env()?;
//!
//! // Or load explicitly, without overrides
//! let config = ShowroomConfig::load(Environment::Production)?;
//!
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use crate::reducer::{DEFAULT_SETTLE_DURATION, LockPolicy};
use showroom_anthropic::messages::DEFAULT_MODEL;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid environment value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
    /// An override variable could not be parsed
    #[error("Failed to parse {var}: {message}")]
    ParseError {
        /// Variable name
        var: String,
        /// What was wrong with it
        message: String,
    },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Development environment (local)
    Development,
    /// Staging environment (pre-production)
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Parse an environment name
    ///
    /// # Errors
    ///
    /// Returns error if environment string is invalid
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Project configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project name shown to visitors
    pub name: String,
    /// Catalog JSON file; the bundled demo catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Language the agent answers in
    pub response_language: String,
}

impl ProjectConfig {
    /// Validate project configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("project name cannot be empty".to_string()));
        }
        if self.response_language.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "response_language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Gamma Residence".to_string(),
            catalog_path: None,
            response_language: "Serbian".to_string(),
        }
    }
}

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Transition settle time in milliseconds
    pub settle_ms: u64,
    /// Which actions the transition lock blocks
    pub lock_policy: LockPolicy,
}

impl NavigationConfig {
    /// Validate navigation configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_ms == 0 {
            return Err(ConfigError::ValidationError("settle_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get settle time as Duration
    #[must_use]
    pub const fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for NavigationConfig {
    #[allow(clippy::cast_possible_truncation)] // 800
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_DURATION.as_millis() as u64,
            lock_policy: LockPolicy::AllNavigation,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Model to use
    pub model: String,
    /// Maximum tokens per reply
    pub max_tokens: u32,
    /// Classifier timeout in seconds
    pub timeout_secs: u64,
    /// Conversation turns included in the prompt
    pub context_turns: usize,
}

impl LlmConfig {
    /// Validate LLM configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::ValidationError("model cannot be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 300,
            timeout_secs: 30,
            context_turns: 6,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ObservabilityConfig {
    /// Validate observability configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Showroom configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowroomConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Project configuration
    pub project: ProjectConfig,
    /// Navigation configuration
    pub navigation: NavigationConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl ShowroomConfig {
    /// Load configuration from the process environment
    ///
    /// Reads `CONFIG_ENV` (defaults to "development"), then applies
    /// `SHOWROOM_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be loaded or is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup` instead of the process environment
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be loaded or is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("CONFIG_ENV").unwrap_or_else(|| "development".to_string());
        let environment = Environment::parse(&env_str)?;

        let mut config = Self::defaults_for(environment);
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration for specific environment
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let config = Self::defaults_for(environment);
        config.validate()?;
        Ok(config)
    }

    fn defaults_for(environment: Environment) -> Self {
        let mut config = Self {
            environment,
            project: ProjectConfig::default(),
            navigation: NavigationConfig::default(),
            llm: LlmConfig::default(),
            observability: ObservabilityConfig::default(),
        };

        // Environment-specific overrides
        match environment {
            Environment::Development => {
                config.observability.log_level = "debug".to_string();
            },
            Environment::Staging => {
                config.observability.log_level = "info".to_string();
            },
            Environment::Production => {
                config.observability.log_level = "warn".to_string();
                config.llm.timeout_secs = 15;
            },
        }

        config
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("SHOWROOM_PROJECT_NAME") {
            self.project.name = name;
        }
        if let Some(path) = lookup("SHOWROOM_CATALOG_PATH") {
            self.project.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(language) = lookup("SHOWROOM_RESPONSE_LANGUAGE") {
            self.project.response_language = language;
        }
        if let Some(ms) = lookup("SHOWROOM_SETTLE_MS") {
            self.navigation.settle_ms = parse_var("SHOWROOM_SETTLE_MS", &ms)?;
        }
        if let Some(policy) = lookup("SHOWROOM_LOCK_POLICY") {
            self.navigation.lock_policy = match policy.to_lowercase().as_str() {
                "all" => LockPolicy::AllNavigation,
                "rotation" => LockPolicy::RotationOnly,
                other => {
                    return Err(ConfigError::ParseError {
                        var: "SHOWROOM_LOCK_POLICY".to_string(),
                        message: format!("expected \"all\" or \"rotation\", got {other:?}"),
                    });
                },
            };
        }
        if let Some(model) = lookup("SHOWROOM_MODEL") {
            self.llm.model = model;
        }
        if let Some(tokens) = lookup("SHOWROOM_MAX_TOKENS") {
            self.llm.max_tokens = parse_var("SHOWROOM_MAX_TOKENS", &tokens)?;
        }
        if let Some(secs) = lookup("SHOWROOM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_var("SHOWROOM_TIMEOUT_SECS", &secs)?;
        }
        if let Some(level) = lookup("SHOWROOM_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        Ok(())
    }

    /// Validate all configuration sections
    ///
    /// # Errors
    ///
    /// Returns error if any section is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.project.validate()?;
        self.navigation.validate()?;
        self.llm.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
        var: var.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::parse("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::parse("PROD").unwrap(), Environment::Production);
        assert!(Environment::parse("moon").is_err());
    }

    #[test]
    fn test_defaults_per_environment() {
        let dev = ShowroomConfig::load(Environment::Development).unwrap();
        assert_eq!(dev.observability.log_level, "debug");
        assert_eq!(dev.navigation.settle_duration(), Duration::from_millis(800));
        assert_eq!(dev.navigation.lock_policy, LockPolicy::AllNavigation);
        assert_eq!(dev.llm.model, "claude-haiku-4-5-20251001");
        assert_eq!(dev.llm.max_tokens, 300);

        let prod = ShowroomConfig::load(Environment::Production).unwrap();
        assert_eq!(prod.observability.log_level, "warn");
        assert_eq!(prod.llm.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_overrides_apply() {
        let config = ShowroomConfig::from_lookup(lookup(&[
            ("CONFIG_ENV", "staging"),
            ("SHOWROOM_PROJECT_NAME", "Riverside"),
            ("SHOWROOM_SETTLE_MS", "250"),
            ("SHOWROOM_LOCK_POLICY", "rotation"),
            ("SHOWROOM_MAX_TOKENS", "512"),
            ("SHOWROOM_CATALOG_PATH", "/tmp/catalog.json"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.project.name, "Riverside");
        assert_eq!(config.navigation.settle_ms, 250);
        assert_eq!(config.navigation.lock_policy, LockPolicy::RotationOnly);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.project.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let err = ShowroomConfig::from_lookup(lookup(&[("SHOWROOM_SETTLE_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref var, .. } if var == "SHOWROOM_SETTLE_MS"));

        let err = ShowroomConfig::from_lookup(lookup(&[("SHOWROOM_SETTLE_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = ShowroomConfig::from_lookup(lookup(&[("SHOWROOM_LOCK_POLICY", "none")])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        let err = ShowroomConfig::from_lookup(lookup(&[("SHOWROOM_LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
