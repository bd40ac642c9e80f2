//! Collaborator contracts consumed and exposed by the notification engine.
//!
//! The engine itself performs no I/O: fetching records, validating
//! hostnames, resolving admins, loading template files and delivering mail
//! all happen behind these traits, which makes the pipeline fully
//! deterministic under fake implementations in tests.

use crate::error::{NotifyError, TemplateError};
use crate::notify::email::EmailMessage;
use crate::notify::Notification;
use crate::record::CertRecord;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;

/// Backing store of certificate records that failed to refresh.
pub trait CertificateSource: Send + Sync {
    /// Fetch the unrefreshed certificate records for one provider.
    ///
    /// An empty vec is the normal "no data" outcome, not an error. Errors
    /// are propagation boundaries forwarded to the caller unchanged.
    fn fetch_unrefreshed(
        &self,
        server_name: &str,
        provider: &str,
    ) -> Result<Vec<CertRecord>, NotifyError>;
}

/// Hostname validation. When no validator is configured every hostname
/// passes (fail-open).
pub trait HostnameValidator: Send + Sync {
    fn is_valid(&self, host_name: &str) -> bool;
}

/// Resolution of a domain's admin role into notification recipients.
pub trait RecipientResolver: Send + Sync {
    /// Principal names holding the admin role of `domain`. `None` or an
    /// empty set means the domain currently has no valid recipients.
    fn resolve_admin_recipients(&self, domain: &str) -> Option<BTreeSet<String>>;
}

/// Source of email body templates, read once at construction.
pub trait TemplateStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<String, TemplateError>;
}

/// Filesystem-backed template store.
#[derive(Debug, Default)]
pub struct FsTemplateStore;

impl TemplateStore for FsTemplateStore {
    fn load(&self, path: &Path) -> Result<String, TemplateError> {
        std::fs::read_to_string(path).map_err(|e| TemplateError::LoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Conversion of a notification into its email representation.
pub trait NotificationToEmailConverter: Send + Sync {
    fn to_email(&self, notification: &Notification) -> EmailMessage;
}

/// Outward mail-delivery contract, implemented by the external sending
/// component. The engine never delivers mail itself.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), NotifyError>;
}
