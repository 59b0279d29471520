//! Outbound verification-email delivery.
//!
//! The account lifecycle treats delivery as fire-and-forget: `dispatch`
//! hands the message to a detached task, and a failed send is logged but
//! never surfaces as a signup or re-verification failure.

use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

/// Email delivery abstraction.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a verification email or return an error to be logged.
    async fn send(&self, to: &str, verification_code: &str) -> anyhow::Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, verification_code: &str) -> anyhow::Result<()> {
        tracing::info!(
            to = %to,
            code = %verification_code,
            "verification email send stub"
        );
        Ok(())
    }
}

/// SendGrid v3 mail sender.
pub struct SendgridNotifier {
    http: reqwest::Client,
    api_key: String,
    from: String,
    public_base_url: String,
}

impl SendgridNotifier {
    pub fn new(api_key: String, from: String, public_base_url: String) -> Self {
        SendgridNotifier {
            http: reqwest::Client::new(),
            api_key,
            from,
            public_base_url,
        }
    }
}

#[async_trait]
impl Notifier for SendgridNotifier {
    async fn send(&self, to: &str, verification_code: &str) -> anyhow::Result<()> {
        let link = format!(
            "{}/api/users/verify/{}",
            self.public_base_url, verification_code
        );

        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": "Verify your email",
            "content": [{
                "type": "text/html",
                "value": format!(
                    "<p>Click the link below to verify your account:</p>\
                     <a href=\"{link}\">Verify Email</a>\
                     <p>Or copy and paste this URL into your browser:</p>\
                     <p>{link}</p>"
                ),
            }],
        });

        let response = self
            .http
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("sendgrid request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("sendgrid responded with {}", response.status());
        }

        Ok(())
    }
}

/// Dispatch a verification email without waiting for the outcome.
///
/// Spawns a detached task; delivery failures are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, email: String, code: String) {
    tokio::spawn(async move {
        if let Err(err) = notifier.send(&email, &code).await {
            tracing::error!(
                action = "notify_failed",
                to = %email,
                "Verification email delivery failed: {err:#}"
            );
        }
    });
}
