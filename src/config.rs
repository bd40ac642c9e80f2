//! Configuration for the notification engine.
//!
//! The engine receives already-parsed values; this module provides the
//! types plus a YAML loader with a validation pass for deployments that
//! configure it from a file.

use crate::error::ConfigError;
use crate::filter::GlobMatcher;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration of the notification engine.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Providers whose unrefreshed certificates generate notifications.
    /// An empty list disables the notification entirely.
    #[serde(default)]
    pub providers: Vec<String>,
    /// Comma or semicolon separated glob list of services exempt from
    /// notification. Empty means nothing is ignored.
    #[serde(default)]
    pub ignored_services: String,
    /// Server identity passed to the certificate source and shown in the
    /// email instructions.
    pub server_name: String,
    /// HTTPS port of the server, appended to `server_name` in the email.
    #[serde(default = "default_https_port")]
    pub https_port: u16,
    /// Email rendering settings.
    pub email: EmailConfig,
}

/// Email rendering settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Fixed subject line; no per-notification variation.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Principal prefix identifying human users, e.g. `user.`.
    #[serde(default = "default_user_domain_prefix")]
    pub user_domain_prefix: String,
    /// Mail domain appended to user names: `user.jane` becomes
    /// `jane@<email_domain>`.
    pub email_domain: String,
    /// Optional path of a body template overriding the embedded one.
    #[serde(default)]
    pub body_template: Option<PathBuf>,
}

fn default_https_port() -> u16 {
    4443
}

fn default_subject() -> String {
    "Unrefreshed certificates notification".to_string()
}

fn default_user_domain_prefix() -> String {
    "user.".to_string()
}

impl NotificationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read, and
    /// [`ConfigError::ValidationError`] or [`ConfigError::InvalidPattern`]
    /// if the content does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NotificationConfig = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values and glob patterns.
    ///
    /// Absent providers or ignore patterns are not errors, they disable the
    /// corresponding stage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "server_name must not be empty".to_string(),
            ));
        }
        if self.email.email_domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "email.email_domain must not be empty".to_string(),
            ));
        }
        GlobMatcher::from_list(&self.ignored_services)?;
        Ok(())
    }

    /// Server address shown in the email, `host:port`.
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_name, self.https_port)
    }
}
