//! Certificate record data model.
//!
//! A [`CertRecord`] is the raw input of the pipeline: one certificate that
//! failed its periodic refresh, as fetched from the backing store. The owning
//! domain and the short service name are both derived from the fully
//! qualified `service` field (`<domain>.<serviceName>`).

use chrono::{DateTime, Utc};

/// Fixed, locale-independent timestamp layout used in encoded details.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One certificate that failed to refresh, read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRecord {
    /// Fully qualified principal name, `<domain>.<serviceName>`.
    pub service: String,
    /// Provider that issued the certificate.
    pub provider: String,
    /// Instance the certificate was issued for.
    pub instance_id: String,
    /// Last successful refresh time, if known.
    pub issue_time: Option<DateTime<Utc>>,
    /// Certificate expiration time, if known.
    pub expiry_time: Option<DateTime<Utc>>,
    /// Hostname the instance registered, if any.
    pub host_name: Option<String>,
}

impl CertRecord {
    /// Owning domain: everything before the last `.` of the service name.
    ///
    /// Returns `None` when the service name has no domain component.
    pub fn domain(&self) -> Option<&str> {
        self.service.rsplit_once('.').map(|(domain, _)| domain)
    }

    /// Short service name: everything after the last `.` of the service name.
    pub fn service_short_name(&self) -> &str {
        self.service
            .rsplit_once('.')
            .map(|(_, short)| short)
            .unwrap_or(&self.service)
    }
}

/// Format a timestamp for the details encoding. Absent timestamps serialize
/// to the empty string so they still occupy their field position.
pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        None => String::new(),
    }
}
