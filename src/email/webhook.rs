//! Webhook-backed dispatcher.
//!
//! The webhook receives
//! `{to, subject, message, attachmentData, attachmentName}` with the PDF as
//! base64 and answers `{success, message}` or `{success: false, error}`.

use super::{Dispatcher, OutgoingEmail};
use crate::error::DispatchError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest raw response body kept when the webhook's answer is not JSON.
const MAX_RAW_BODY_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    to: &'a str,
    subject: &'a str,
    message: &'a str,
    attachment_data: String,
    attachment_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .user_agent("sello/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DispatchError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_secs,
        })
    }

    fn classify(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout(self.timeout_secs)
        } else {
            DispatchError::Transport(e.to_string())
        }
    }
}

/// Interpret a 200 response body.
fn interpret_ok_body(body: &str) -> Result<(), DispatchError> {
    match serde_json::from_str::<WebhookResponse>(body) {
        Ok(WebhookResponse { success: true, .. }) => Ok(()),
        Ok(WebhookResponse { error, .. }) => Err(DispatchError::Rejected(
            error.unwrap_or_else(|| "webhook reported an error".to_string()),
        )),
        Err(_) => Err(DispatchError::Rejected(
            body.chars().take(MAX_RAW_BODY_CHARS).collect(),
        )),
    }
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
        let request = WebhookRequest {
            to: &email.to,
            subject: &email.subject,
            message: &email.message,
            attachment_data: STANDARD.encode(&email.attachment),
            attachment_name: &email.attachment_name,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        log::debug!("Webhook answered {} for {}: {}", status, email.to, body);

        if status != StatusCode::OK {
            return Err(DispatchError::Http {
                status: status.as_u16(),
                body,
            });
        }
        interpret_ok_body(&body)
    }
}
