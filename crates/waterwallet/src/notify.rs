//! Outbound alerts.
//!
//! Alerts go through the [`Notifier`] trait so the device logic does not care
//! whether a real SMS gateway is configured. [`SmsGateway`] posts to an HTTP
//! SMS provider; [`LogNotifier`] only writes the alert to the log.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("SMS gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },
}

/// Boxed future returned by [`Notifier::send`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Delivers a short text alert to the household.
pub trait Notifier: Send + Sync {
    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a>;
}

// ── LogNotifier ────────────────────────────────────────────────────

/// Writes alerts to the log. Used when no SMS gateway is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            warn!("ALERT (no SMS gateway configured): {message}");
            Ok(())
        })
    }
}

// ── SmsGateway ─────────────────────────────────────────────────────

/// Connection settings for an HTTP SMS provider.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Endpoint that accepts `POST {"to": ..., "message": ...}`.
    pub url: String,
    /// Sent as a bearer token.
    pub api_key: String,
    /// Destination phone number.
    pub to: String,
    /// Request timeout. Default: 10 seconds.
    pub timeout: Duration,
}

impl SmsConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            to: to.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    message: &'a str,
}

/// Sends alerts through an HTTP SMS provider.
pub struct SmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .user_agent("waterwallet/0.1")
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

impl Notifier for SmsGateway {
    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.config.url)
                .bearer_auth(&self.config.api_key)
                .json(&SmsPayload {
                    to: &self.config.to,
                    message,
                })
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(NotifyError::Gateway {
                    status: status.as_u16(),
                    body,
                });
            }
            info!("SMS alert sent to {}", self.config.to);
            Ok(())
        })
    }
}
