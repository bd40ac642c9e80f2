// src/lib.rs
//! certnotify - Per-domain admin notifications for certificates that failed
//! to refresh.
//!
//! One run turns a fetched batch of certificate records into notifications:
//! records are filtered (service ignore-list, hostname validity), grouped by
//! owning domain, packed into a delimited details string and addressed to
//! each domain's admin role. Each notification can later be rendered as an
//! email whose body highlights the real record when exactly one was packed.

pub mod aggregate;
pub mod config;
pub mod details;
pub mod error;
pub mod filter;
pub mod notify;
pub mod record;

// Re-export commonly used types
pub use aggregate::group_by_domain;
pub use config::{EmailConfig, NotificationConfig};
pub use details::{decode, entry_count, CertDetailEntry, EncodedDetails};
pub use filter::{GlobMatcher, RecordFilter};
pub use notify::{
    dispatch_all, CertRefreshNotificationTask, CertificateSource, EmailMessage, EmailSender,
    EmailTemplater, FsTemplateStore, HostnameValidator, Notification,
    NotificationToEmailConverter, RecipientResolver, TemplateStore,
};
pub use record::CertRecord;
