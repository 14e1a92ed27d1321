//! Email delivery of generated certificates.
//!
//! Sending is delegated to a [`Dispatcher`]. The shipped implementation posts
//! each message to an HTTP webhook ([`WebhookDispatcher`]) which does the
//! actual mail sending.

pub mod webhook;

pub use webhook::WebhookDispatcher;

use crate::error::{DispatchError, Result, SelloError};
use crate::model::Rgb;
use crate::pdf::{image_to_pdf, pdf_bytes};
use crate::render::{Template, blend_coverage};
use crate::text::{Face, render_text};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SUBJECT: &str = "Your Certificate";
pub const DEFAULT_MESSAGE: &str =
    "Dear {Name},\n\nPlease find your certificate attached.\n\nBest regards,\nCertificate Team";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Placeholder in the message body replaced by the recipient's name.
pub const NAME_PLACEHOLDER: &str = "{Name}";

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub webhook_url: String,
    /// Data column holding recipient addresses.
    #[serde(default)]
    pub email_column: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Body text; `{Name}` is replaced per recipient.
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            email_column: String::new(),
            subject: default_subject(),
            message: default_message(),
            timeout_secs: default_timeout(),
        }
    }
}

impl EmailSettings {
    pub fn check_complete(&self) -> Result<()> {
        if self.webhook_url.trim().is_empty() {
            return Err(SelloError::NotReady("email webhook URL is not set".into()));
        }
        if self.email_column.trim().is_empty() {
            return Err(SelloError::NotReady("email column is not selected".into()));
        }
        Ok(())
    }

    pub fn personalize(&self, name: Option<&str>) -> String {
        self.message.replace(NAME_PLACEHOLDER, name.unwrap_or(""))
    }
}

/// Reject blank addresses and anything without an `@`.
pub fn validate_recipient(address: &str) -> std::result::Result<&str, DispatchError> {
    let address = address.trim();
    if address.is_empty() || !address.contains('@') {
        return Err(DispatchError::InvalidRecipient(address.to_string()));
    }
    Ok(address)
}

/// One message with a single PDF attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub message: String,
    pub attachment: Vec<u8>,
    pub attachment_name: String,
}

impl OutgoingEmail {
    /// Build a message attaching the file at `path` under its own file name.
    pub fn with_file(
        to: &str,
        subject: &str,
        message: String,
        path: &Path,
    ) -> std::result::Result<Self, DispatchError> {
        let attachment = std::fs::read(path)?;
        let attachment_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            to: to.to_string(),
            subject: subject.to_string(),
            message,
            attachment,
            attachment_name,
        })
    }
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), DispatchError>;
}

/// Send a throwaway certificate to check the delivery setup end to end.
pub async fn send_test_email(dispatcher: &dyn Dispatcher, to: &str) -> Result<()> {
    let to = validate_recipient(to)?;

    let mut image = Template::blank(400, 300, Rgb::WHITE).fresh_copy();
    let text = render_text("TEST CERTIFICATE", &Face::Builtin, 12);
    blend_coverage(&mut image, &text, (50, 150), Rgb::BLACK);
    let attachment = pdf_bytes(&mut image_to_pdf(&image)?)?;

    let email = OutgoingEmail {
        to: to.to_string(),
        subject: "Test Certificate Email".to_string(),
        message: "This is a test email from the Certificate Generator.".to_string(),
        attachment,
        attachment_name: "test_certificate.pdf".to_string(),
    };
    dispatcher.send(&email).await?;
    log::info!("Test email sent to {}", to);
    Ok(())
}
