//! Per-domain notification assembly for unrefreshed certificates.
//!
//! # Architecture
//!
//! The pipeline runs once per invocation over an already-fetched batch:
//! ```text
//! filter.rs -> aggregate.rs -> details.rs -> notify/ (assembly) -> notify/email.rs
//! ```
//! Fetching records, resolving recipients and delivering mail stay behind
//! the trait contracts in [`traits`]; the task body is pure orchestration
//! with no suspension points.

pub mod email;
pub mod traits;

use crate::aggregate::group_by_domain;
use crate::config::NotificationConfig;
use crate::details::EncodedDetails;
use crate::error::{NotifyError, TaskError};
use crate::filter::{GlobMatcher, RecordFilter};
use crate::record::CertRecord;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub use email::{EmailMessage, EmailTemplater};
pub use traits::{
    CertificateSource, EmailSender, FsTemplateStore, HostnameValidator,
    NotificationToEmailConverter, RecipientResolver, TemplateStore,
};

const DESCRIPTION: &str = "certificate failed refresh notification";

/// A notification addressed to the admin role members of one domain.
///
/// Notifications have no identity beyond their recipients and details; they
/// are produced fresh each run and never persisted. The converter capability
/// renders the email representation on demand.
#[derive(Clone)]
pub struct Notification {
    /// Principal names of the domain's admin role members.
    pub recipients: BTreeSet<String>,
    /// Encoded per-domain details; `None` marks missing metadata.
    pub details: Option<EncodedDetails>,
    converter: Arc<dyn NotificationToEmailConverter>,
}

impl Notification {
    pub fn new(
        recipients: BTreeSet<String>,
        details: Option<EncodedDetails>,
        converter: Arc<dyn NotificationToEmailConverter>,
    ) -> Self {
        Self {
            recipients,
            details,
            converter,
        }
    }

    /// Render this notification as an email through its converter.
    pub fn as_email(&self) -> EmailMessage {
        self.converter.to_email(self)
    }
}

impl PartialEq for Notification {
    fn eq(&self, other: &Self) -> bool {
        self.recipients == other.recipients && self.details == other.details
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("recipients", &self.recipients)
            .field("details", &self.details)
            .finish()
    }
}

/// Periodic task turning unrefreshed certificate records into per-domain
/// admin notifications.
pub struct CertRefreshNotificationTask {
    server_name: String,
    providers: Vec<String>,
    filter: RecordFilter,
    source: Arc<dyn CertificateSource>,
    resolver: Arc<dyn RecipientResolver>,
    converter: Arc<EmailTemplater>,
}

impl CertRefreshNotificationTask {
    /// Build the task from configuration and its external collaborators.
    ///
    /// The glob ignore-list is compiled and the email template loaded once
    /// here; both are immutable for the lifetime of the task.
    ///
    /// # Errors
    /// Returns [`TaskError`] if the ignore-list does not compile or the
    /// template override cannot be loaded.
    pub fn new(
        config: &NotificationConfig,
        source: Arc<dyn CertificateSource>,
        hostname_validator: Option<Arc<dyn HostnameValidator>>,
        resolver: Arc<dyn RecipientResolver>,
        template_store: &dyn TemplateStore,
    ) -> Result<Self, TaskError> {
        let ignored_services = GlobMatcher::from_list(&config.ignored_services)?;
        let converter = Arc::new(EmailTemplater::new(config, template_store)?);
        Ok(Self {
            server_name: config.server_name.clone(),
            providers: config.providers.clone(),
            filter: RecordFilter::new(ignored_services, hostname_validator),
            source,
            resolver,
            converter,
        })
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTION
    }

    /// Run one batch to completion: fetch per provider, filter, group by
    /// domain and assemble one notification per domain with recipients.
    ///
    /// Every empty stage is a normal silent outcome yielding an empty list.
    ///
    /// # Errors
    /// Only certificate source failures propagate; they are not defined by
    /// this task and belong to the calling layer.
    pub fn get_notifications(&self) -> Result<Vec<Notification>, NotifyError> {
        if self.providers.is_empty() {
            debug!("no configured providers");
            return Ok(Vec::new());
        }

        let mut unrefreshed = Vec::new();
        for provider in &self.providers {
            unrefreshed.extend(self.source.fetch_unrefreshed(&self.server_name, provider)?);
        }
        if unrefreshed.is_empty() {
            debug!("no unrefreshed certificates available to send notifications");
            return Ok(Vec::new());
        }

        let surviving = self.filter.apply(unrefreshed);
        if surviving.is_empty() {
            return Ok(Vec::new());
        }

        let mut notifications = Vec::new();
        for (domain, records) in group_by_domain(surviving) {
            if let Some(notification) = self.assemble(&domain, &records) {
                notifications.push(notification);
            }
        }
        Ok(notifications)
    }

    /// Build one domain's notification, or `None` when the domain has no
    /// valid recipients. A skipped domain never affects the others.
    fn assemble(&self, domain: &str, records: &[CertRecord]) -> Option<Notification> {
        let details = EncodedDetails::encode(domain, records);
        let recipients = match self.resolver.resolve_admin_recipients(domain) {
            Some(recipients) if !recipients.is_empty() => recipients,
            _ => {
                debug!(domain = %domain, "no valid recipients for domain, skipping notification");
                return None;
            }
        };
        Some(Notification::new(
            recipients,
            Some(details),
            self.converter.clone(),
        ))
    }
}

impl std::fmt::Debug for CertRefreshNotificationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertRefreshNotificationTask")
            .field("server_name", &self.server_name)
            .field("providers", &self.providers)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Render and deliver a batch of notifications through `sender`.
///
/// Emails with a `None` body or no qualified recipients are skipped, not
/// sent broken. Returns the number of emails handed to the sender.
///
/// # Errors
/// Propagates the first delivery failure.
pub async fn dispatch_all(
    notifications: &[Notification],
    sender: &dyn EmailSender,
) -> Result<usize, NotifyError> {
    let mut sent = 0;
    for notification in notifications {
        let email = notification.as_email();
        if email.body.is_none() {
            warn!("skipping notification email with no body");
            continue;
        }
        if email.recipients.is_empty() {
            debug!("skipping notification email with no qualified recipients");
            continue;
        }
        sender.send(&email).await?;
        sent += 1;
    }
    Ok(sent)
}
