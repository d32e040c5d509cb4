use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::dto::Channel;
use crate::model::user::User;
use crate::util::email::{EmailMessage, SmtpEmailService};
use crate::util::sms::SmsGateway;

/// Per-channel delivery tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    pub successful: usize,
    pub failed: usize,
}

impl BulkResult {
    fn all_failed(count: usize) -> Self {
        BulkResult { successful: 0, failed: count }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<BulkResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms: Option<BulkResult>,
}

/// Outbound email and SMS. Failures are tallied, never returned as errors.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_bulk_email(&self, recipients: &[String], subject: &str, message: &str) -> BulkResult;
    async fn send_bulk_sms(&self, recipients: &[String], message: &str) -> BulkResult;
    fn email_enabled(&self) -> bool;
    fn sms_enabled(&self) -> bool;
}

/// Sends `message` over `channel` to the users whose preferences allow it.
/// Users without a phone number are skipped for SMS.
pub async fn deliver(
    notifier: &dyn NotificationService,
    channel: Channel,
    recipients: &[User],
    subject: &str,
    email_body: &str,
    sms_body: &str,
) -> ChannelResults {
    let mut results = ChannelResults::default();
    if channel.includes_email() {
        let emails: Vec<String> = recipients.iter().filter(|u| u.wants_email()).map(|u| u.email.clone()).collect();
        results.email = Some(if emails.is_empty() {
            BulkResult::default()
        } else {
            notifier.send_bulk_email(&emails, subject, email_body).await
        });
    }
    if channel.includes_sms() {
        let phones: Vec<String> = recipients
            .iter()
            .filter(|u| u.wants_sms())
            .filter_map(|u| u.phone.clone())
            .collect();
        results.sms = Some(if phones.is_empty() {
            BulkResult::default()
        } else {
            notifier.send_bulk_sms(&phones, sms_body).await
        });
    }
    results
}

pub struct NotificationServiceImpl {
    email: Option<Arc<SmtpEmailService>>,
    sms: Option<Arc<SmsGateway>>,
    sender_name: String,
}

impl NotificationServiceImpl {
    pub fn new(email: Option<Arc<SmtpEmailService>>, sms: Option<Arc<SmsGateway>>, sender_name: String) -> Self {
        if email.is_none() {
            warn!("Email delivery is not configured");
        }
        if sms.is_none() {
            warn!("SMS delivery is not configured");
        }
        NotificationServiceImpl { email, sms, sender_name }
    }
}

fn tally(outcomes: Vec<bool>) -> BulkResult {
    let successful = outcomes.iter().filter(|ok| **ok).count();
    BulkResult { successful, failed: outcomes.len() - successful }
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    #[instrument(skip(self, recipients, message), fields(recipients = recipients.len()))]
    async fn send_bulk_email(&self, recipients: &[String], subject: &str, message: &str) -> BulkResult {
        let Some(service) = &self.email else {
            warn!("Email not configured, {} recipients skipped", recipients.len());
            return BulkResult::all_failed(recipients.len());
        };
        let concurrency = service.config.max_concurrent_sends.max(1);
        let outcomes: Vec<bool> = stream::iter(recipients.iter().cloned())
            .map(|to| {
                let email = EmailMessage::notification(&to, subject, message, &self.sender_name);
                async move {
                    match service.send_email(email).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(recipient = %to, "Email delivery failed: {}", e);
                            false
                        }
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        let result = tally(outcomes);
        info!(successful = result.successful, failed = result.failed, "Bulk email finished");
        result
    }

    #[instrument(skip(self, recipients, message), fields(recipients = recipients.len()))]
    async fn send_bulk_sms(&self, recipients: &[String], message: &str) -> BulkResult {
        let Some(gateway) = &self.sms else {
            warn!("SMS not configured, {} recipients skipped", recipients.len());
            return BulkResult::all_failed(recipients.len());
        };
        let concurrency = gateway.config.max_concurrent_sends.max(1);
        let outcomes: Vec<bool> = stream::iter(recipients.iter().cloned())
            .map(|to| async move {
                match gateway.send_sms(&to, message).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(recipient = %to, "SMS delivery failed: {}", e);
                        false
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        let result = tally(outcomes);
        info!(successful = result.successful, failed = result.failed, "Bulk SMS finished");
        result
    }

    fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    fn sms_enabled(&self) -> bool {
        self.sms.is_some()
    }
}
