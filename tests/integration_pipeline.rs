//! End-to-end pipeline tests with fake collaborators: fetch, filter, group,
//! assemble and render, then dispatch through a capturing sender.

use certnotify::{
    dispatch_all, CertRecord, CertRefreshNotificationTask, CertificateSource, EmailConfig,
    EmailMessage, EmailSender, HostnameValidator, NotificationConfig, RecipientResolver,
    TemplateStore,
};
use certnotify::error::{NotifyError, TemplateError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

struct FakeSource {
    by_provider: BTreeMap<String, Vec<CertRecord>>,
}

impl CertificateSource for FakeSource {
    fn fetch_unrefreshed(
        &self,
        _server_name: &str,
        provider: &str,
    ) -> Result<Vec<CertRecord>, NotifyError> {
        Ok(self.by_provider.get(provider).cloned().unwrap_or_default())
    }
}

struct FakeResolver {
    admins: BTreeMap<String, BTreeSet<String>>,
}

impl RecipientResolver for FakeResolver {
    fn resolve_admin_recipients(&self, domain: &str) -> Option<BTreeSet<String>> {
        self.admins.get(domain).cloned()
    }
}

struct AcceptAll;

impl HostnameValidator for AcceptAll {
    fn is_valid(&self, _host_name: &str) -> bool {
        true
    }
}

struct NoStore;

impl TemplateStore for NoStore {
    fn load(&self, path: &Path) -> Result<String, TemplateError> {
        Err(TemplateError::LoadFailed {
            path: path.display().to_string(),
            message: "unused in tests".to_string(),
        })
    }
}

#[derive(Default)]
struct CapturingSender {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for CapturingSender {
    async fn send(&self, email: &EmailMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn config() -> NotificationConfig {
    NotificationConfig {
        providers: vec!["aws".to_string(), "gcp".to_string()],
        ignored_services: "*.bad*".to_string(),
        server_name: "certs.example.com".to_string(),
        https_port: 8443,
        email: EmailConfig {
            subject: "Unrefreshed certificates".to_string(),
            user_domain_prefix: "user.".to_string(),
            email_domain: "example.com".to_string(),
            body_template: None,
        },
    }
}

fn record(service: &str, provider: &str, instance_id: &str, host: &str) -> CertRecord {
    CertRecord {
        service: service.to_string(),
        provider: provider.to_string(),
        instance_id: instance_id.to_string(),
        issue_time: Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
        expiry_time: Some(Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap()),
        host_name: Some(host.to_string()),
    }
}

fn admins(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
    entries
        .iter()
        .map(|(domain, users)| {
            (
                domain.to_string(),
                users.iter().map(|u| u.to_string()).collect(),
            )
        })
        .collect()
}

fn build_task(
    by_provider: BTreeMap<String, Vec<CertRecord>>,
    admin_map: BTreeMap<String, BTreeSet<String>>,
) -> CertRefreshNotificationTask {
    CertRefreshNotificationTask::new(
        &config(),
        Arc::new(FakeSource { by_provider }),
        Some(Arc::new(AcceptAll)),
        Arc::new(FakeResolver { admins: admin_map }),
        &NoStore,
    )
    .unwrap()
}

#[test]
fn empty_input_produces_no_notifications() {
    let task = build_task(BTreeMap::new(), admins(&[("sports", &["user.jane"])]));
    assert!(task.get_notifications().unwrap().is_empty());
}

#[test]
fn full_run_single_record_email_has_real_values() {
    let mut by_provider = BTreeMap::new();
    by_provider.insert(
        "aws".to_string(),
        vec![record("sports.api", "aws", "i-1", "h1")],
    );
    let task = build_task(by_provider, admins(&[("sports", &["user.jane"])]));

    let notifications = task.get_notifications().unwrap();
    assert_eq!(notifications.len(), 1);

    let email = notifications[0].as_email();
    assert_eq!(email.subject, "Unrefreshed certificates");
    assert_eq!(email.recipients.len(), 1);
    assert_eq!(email.recipients[0].to_string(), "jane@example.com");

    let body = email.body.unwrap();
    assert!(body.contains("api"));
    assert!(body.contains("aws"));
    assert!(body.contains("i-1"));
    assert!(body.contains("sports"));
    assert!(body.contains("certs.example.com:8443"));
    assert!(!body.contains("&lt;SERVICE&gt;"));
}

#[test]
fn full_run_multi_record_email_keeps_generic_tokens() {
    let mut by_provider = BTreeMap::new();
    by_provider.insert(
        "aws".to_string(),
        vec![record("sports.api", "aws", "i-1", "h1")],
    );
    by_provider.insert(
        "gcp".to_string(),
        vec![record("sports.db", "gcp", "i-2", "h2")],
    );
    let task = build_task(by_provider, admins(&[("sports", &["user.jane"])]));

    let notifications = task.get_notifications().unwrap();
    assert_eq!(notifications.len(), 1);

    let details = notifications[0].details.as_ref().unwrap();
    assert_eq!(details.entry_count(), 2);

    let body = notifications[0].as_email().body.unwrap();
    assert!(body.contains("&lt;SERVICE&gt;"));
    assert!(body.contains("&lt;PROVIDER&gt;"));
    assert!(body.contains("&lt;INSTANCE-ID&gt;"));
    assert!(body.contains(&details.unrefreshed_certs));
}

#[test]
fn ignored_services_and_missing_recipients_do_not_break_the_run() {
    let mut by_provider = BTreeMap::new();
    by_provider.insert(
        "aws".to_string(),
        vec![
            record("sports.api", "aws", "i-1", "h1"),
            record("sports.bad-service", "aws", "i-2", "h2"),
            record("orphan.ui", "aws", "i-3", "h3"),
        ],
    );
    // no admins for "orphan"
    let task = build_task(by_provider, admins(&[("sports", &["user.jane"])]));

    let notifications = task.get_notifications().unwrap();
    assert_eq!(notifications.len(), 1);

    let details = notifications[0].details.as_ref().unwrap();
    assert_eq!(details.domain, "sports");
    assert_eq!(details.entry_count(), 1);
    assert!(!details.unrefreshed_certs.contains("bad-service"));
}

#[tokio::test]
async fn dispatch_sends_renderable_emails_and_skips_the_rest() {
    let mut by_provider = BTreeMap::new();
    by_provider.insert(
        "aws".to_string(),
        vec![
            record("sports.api", "aws", "i-1", "h1"),
            record("weather.ui", "aws", "i-2", "h2"),
        ],
    );
    // weather's only admin is a service principal, so its email has no
    // qualified recipients and must be skipped at dispatch time
    let task = build_task(
        by_provider,
        admins(&[
            ("sports", &["user.jane", "user.joe"]),
            ("weather", &["weather.ops"]),
        ]),
    );

    let notifications = task.get_notifications().unwrap();
    assert_eq!(notifications.len(), 2);

    let sender = CapturingSender::default();
    let sent = dispatch_all(&notifications, &sender).await.unwrap();
    assert_eq!(sent, 1);

    let sent_emails = sender.sent.lock().unwrap();
    assert_eq!(sent_emails.len(), 1);
    let addresses: Vec<String> = sent_emails[0]
        .recipients
        .iter()
        .map(|m| m.to_string())
        .collect();
    assert_eq!(addresses, vec!["jane@example.com", "joe@example.com"]);
}
