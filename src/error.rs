//! Centralized error types for certnotify using thiserror.

use thiserror::Error;

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors related to the delimited-text details encoding.
#[derive(Error, Debug)]
pub enum DetailsError {
    #[error("malformed details entry at index {index}: expected 6 fields, found {fields}")]
    MalformedEntry { index: usize, fields: usize },
}

/// Errors related to email body templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to load template '{path}': {message}")]
    LoadFailed { path: String, message: String },
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors surfaced by external notification collaborators.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to fetch unrefreshed certificates for provider '{provider}': {message}")]
    FetchFailed { provider: String, message: String },
    #[error("failed to send notification email: {0}")]
    SendFailed(String),
}

/// Errors raised while building the notification task.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}
