//! Email rendering of unrefreshed certificate notifications.
//!
//! The templater is built once per process: the body template is loaded at
//! construction and treated as immutable afterwards. Rendering depends on
//! how many entries were packed into the notification details: a single
//! entry has its real service, provider and instance id substituted into
//! the remediation instructions, while multiple entries keep generic
//! angle-bracket tokens since no one record can be highlighted.

use crate::config::NotificationConfig;
use crate::details::{entry_count, EncodedDetails};
use crate::error::TemplateError;
use crate::notify::traits::{NotificationToEmailConverter, TemplateStore};
use crate::notify::Notification;
use lettre::message::Mailbox;
use minijinja::{context, Environment, UndefinedBehavior};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Embedded default body template.
const DEFAULT_BODY_TEMPLATE: &str = include_str!("../../templates/unrefreshed-certs.html");

// Generic tokens shown when no single record can be highlighted.
// Pre-escaped because the body template is HTML.
const GENERIC_SERVICE: &str = "&lt;SERVICE&gt;";
const GENERIC_PROVIDER: &str = "&lt;PROVIDER&gt;";
const GENERIC_INSTANCE_ID: &str = "&lt;INSTANCE-ID&gt;";

/// Rendered email, ready for an external delivery component.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    /// `None` means the email must not be sent.
    pub body: Option<String>,
    pub recipients: Vec<Mailbox>,
}

/// Renders notifications into [`EmailMessage`]s.
pub struct EmailTemplater {
    subject: String,
    body_template: String,
    server_address: String,
    user_domain_prefix: String,
    email_domain: String,
    env: Environment<'static>,
}

impl EmailTemplater {
    /// Build a templater from configuration, loading the body template once
    /// through `store` when an override path is configured.
    ///
    /// # Errors
    /// Returns [`TemplateError::LoadFailed`] if the override template cannot
    /// be read.
    pub fn new(
        config: &NotificationConfig,
        store: &dyn TemplateStore,
    ) -> Result<Self, TemplateError> {
        let body_template = match &config.email.body_template {
            Some(path) => store.load(path)?,
            None => DEFAULT_BODY_TEMPLATE.to_string(),
        };

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);

        Ok(Self {
            subject: config.email.subject.clone(),
            body_template,
            server_address: config.server_address(),
            user_domain_prefix: config.email.user_domain_prefix.clone(),
            email_domain: config.email.email_domain.clone(),
            env,
        })
    }

    /// Render a notification as an email. The subject is fixed; the body is
    /// `None` when details are missing or malformed, in which case the
    /// caller must drop the email rather than send a broken one.
    pub fn render(&self, notification: &Notification) -> EmailMessage {
        EmailMessage {
            subject: self.subject.clone(),
            body: notification
                .details
                .as_ref()
                .and_then(|details| self.render_body(details)),
            recipients: self.qualified_addresses(&notification.recipients),
        }
    }

    fn render_body(&self, details: &EncodedDetails) -> Option<String> {
        let entries = match details.decode_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(domain = %details.domain, error = %e, "failed to decode notification details");
                return None;
            }
        };
        if entries.is_empty() {
            debug!(domain = %details.domain, "notification has no certificate entries");
            return None;
        }

        // Fill real values only when a single record can be unambiguously
        // highlighted in the remediation instructions.
        let (service, provider, instance_id) = if entry_count(&details.unrefreshed_certs) == 1 {
            let entry = &entries[0];
            (
                entry.service.clone(),
                entry.provider.clone(),
                entry.instance_id.clone(),
            )
        } else {
            (
                GENERIC_SERVICE.to_string(),
                GENERIC_PROVIDER.to_string(),
                GENERIC_INSTANCE_ID.to_string(),
            )
        };

        let rendered = self.env.render_str(
            &self.body_template,
            context! {
                domain => details.domain,
                unrefreshed_certs => details.unrefreshed_certs,
                entries => entries,
                server_address => self.server_address,
                service => service,
                provider => provider,
                instance_id => instance_id,
            },
        );
        match rendered {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(domain = %details.domain, error = %e, "email body render failed");
                None
            }
        }
    }

    /// Map admin-role principals to mail addresses. Only principals under
    /// the user domain prefix receive email; service principals in the
    /// admin role are skipped.
    fn qualified_addresses(&self, recipients: &BTreeSet<String>) -> Vec<Mailbox> {
        let mut addresses = Vec::new();
        for recipient in recipients {
            let user = match recipient.strip_prefix(self.user_domain_prefix.as_str()) {
                Some(user) if !user.is_empty() => user,
                _ => {
                    debug!(recipient = %recipient, "recipient is not a user principal, skipping");
                    continue;
                }
            };
            match format!("{}@{}", user, self.email_domain).parse::<Mailbox>() {
                Ok(mailbox) => addresses.push(mailbox),
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "invalid email address, skipping")
                }
            }
        }
        addresses
    }
}

impl NotificationToEmailConverter for EmailTemplater {
    fn to_email(&self, notification: &Notification) -> EmailMessage {
        self.render(notification)
    }
}

impl std::fmt::Debug for EmailTemplater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailTemplater")
            .field("subject", &self.subject)
            .field("server_address", &self.server_address)
            .field("template_len", &self.body_template.len())
            .finish()
    }
}
