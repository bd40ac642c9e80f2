//! Service ignore-list and hostname validity filtering.
//!
//! The filter is the first pipeline stage: it removes records that should
//! not generate a notification. Two independent passes are composed in
//! order: a glob-based service ignore-list, then hostname validation
//! through an optional external validator. Both passes are pure and the
//! composition is idempotent.

use crate::error::ConfigError;
use crate::notify::traits::HostnameValidator;
use crate::record::CertRecord;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Case-sensitive glob matcher over a configured pattern list.
///
/// Glob semantics: `*` matches any run of characters, `?` matches exactly
/// one character, anchored against the full input. Patterns compile to
/// regexes at construction, so matching never fails at runtime.
#[derive(Debug, Default)]
pub struct GlobMatcher {
    patterns: Vec<Regex>,
}

impl GlobMatcher {
    /// Parse a comma or semicolon separated glob pattern list.
    ///
    /// Blank items are skipped; an empty list matches nothing.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPattern`] if a pattern does not compile.
    pub fn from_list(list: &str) -> Result<Self, ConfigError> {
        let mut patterns = Vec::new();
        for pattern in list.split([',', ';']).map(str::trim) {
            if pattern.is_empty() {
                continue;
            }
            patterns.push(compile_glob(pattern)?);
        }
        Ok(Self { patterns })
    }

    /// Matcher with no patterns, matching nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `value` matches any configured pattern.
    pub fn is_match(&self, value: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(value))
    }

    /// Whether no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translate one glob pattern into an anchored regex.
fn compile_glob(pattern: &str) -> Result<Regex, ConfigError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            c if c.is_ascii_punctuation() => {
                source.push('\\');
                source.push(c);
            }
            c => source.push(c),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Two-pass record filter: service ignore-list, then hostname validity.
pub struct RecordFilter {
    ignored_services: GlobMatcher,
    hostname_validator: Option<Arc<dyn HostnameValidator>>,
}

impl RecordFilter {
    pub fn new(
        ignored_services: GlobMatcher,
        hostname_validator: Option<Arc<dyn HostnameValidator>>,
    ) -> Self {
        Self {
            ignored_services,
            hostname_validator,
        }
    }

    /// Records whose service matches none of the ignore patterns.
    pub fn retain_allowed_services(&self, records: Vec<CertRecord>) -> Vec<CertRecord> {
        if self.ignored_services.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| !self.ignored_services.is_match(&r.service))
            .collect()
    }

    /// Records whose hostname passes validation. No validator means every
    /// record passes (fail-open).
    pub fn retain_valid_hosts(&self, records: Vec<CertRecord>) -> Vec<CertRecord> {
        match &self.hostname_validator {
            None => records,
            Some(validator) => records
                .into_iter()
                .filter(|r| validator.is_valid(r.host_name.as_deref().unwrap_or("")))
                .collect(),
        }
    }

    /// Both passes composed in order. Emptiness at either stage is a normal
    /// silent outcome, logged at debug level.
    pub fn apply(&self, records: Vec<CertRecord>) -> Vec<CertRecord> {
        let allowed = self.retain_allowed_services(records);
        if allowed.is_empty() {
            debug!("no unrefreshed certificates with allowed services");
            return allowed;
        }

        let valid = self.retain_valid_hosts(allowed);
        if valid.is_empty() {
            debug!("no unrefreshed certificates with valid hosts");
        }
        valid
    }
}

impl std::fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFilter")
            .field("ignored_services", &self.ignored_services)
            .field("has_hostname_validator", &self.hostname_validator.is_some())
            .finish()
    }
}
