//! Optional per-row verification overlay.
//!
//! When active, every certificate carries a `Verification ID: <uid>` line in
//! link blue, and that line is clickable, pointing at the verification
//! endpoint for the row's UID.

use super::field::Anchor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verification endpoint used when the job does not name one.
pub const DEFAULT_VERIFY_URL: &str = "https://avishkaar.co/s3_virtual/verify.php";

/// Smallest size the verification text is ever rendered at.
pub const MIN_RENDER_SIZE: u32 = 8;

fn default_font_size() -> u32 {
    14
}

fn default_base_url() -> String {
    DEFAULT_VERIFY_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Data column holding each row's unique identifier.
    #[serde(default)]
    pub uid_column: String,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uid_column: String::new(),
            anchor: None,
            font_size: default_font_size(),
            font: None,
            base_url: default_base_url(),
        }
    }
}

impl VerificationConfig {
    /// Enabled and placed. Whether the UID column exists is a data question,
    /// answered by the batch generator.
    pub fn is_active(&self) -> bool {
        self.enabled && self.anchor.is_some() && !self.uid_column.trim().is_empty()
    }

    pub fn render_size(&self) -> u32 {
        self.font_size.max(MIN_RENDER_SIZE)
    }

    pub fn text(uid: &str) -> String {
        format!("Verification ID: {}", uid)
    }

    /// Canonical verification link for `uid`.
    ///
    /// The UID travels as a percent-encoded `uid` query parameter. A base URL
    /// that cannot be parsed is joined verbatim.
    pub fn url(&self, uid: &str) -> String {
        match reqwest::Url::parse_with_params(&self.base_url, &[("uid", uid)]) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::warn!("Verification base URL {:?} is not a valid URL: {}", self.base_url, e);
                format!("{}?uid={}", self.base_url, uid)
            }
        }
    }
}
