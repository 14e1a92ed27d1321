//! Job configuration: the frozen snapshot a batch run works from.

use super::field::FieldSet;
use super::verification::VerificationConfig;
use crate::email::EmailSettings;
use crate::error::{Result, SelloError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything a run needs besides the data itself.
///
/// Loaded from JSON:
///
/// ```json
/// {
///   "template": "template.png",
///   "fields": [
///     { "id": 0, "field_type": "name", "data_column": "Name",
///       "font_size": 48, "color": "#1a1a1a", "anchor": [400, 100] }
///   ],
///   "verification": { "enabled": true, "uid_column": "UID", "anchor": [400, 560] },
///   "email": { "webhook_url": "https://hooks.example.com/send", "email_column": "Email" },
///   "parallel": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub fields: FieldSet,
    #[serde(default)]
    pub verification: Option<VerificationConfig>,
    #[serde(default)]
    pub email: Option<EmailSettings>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Render rows on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
            .map_err(|e| SelloError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SelloError::Config(e.to_string()))
    }

    /// Paths in the job file are relative to the file itself.
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(t) = self.template.as_mut() {
            join(t);
        }
        for id in self.fields.iter().map(|f| f.id).collect::<Vec<_>>() {
            if let Some(font) = self.fields.get_mut(id).and_then(|f| f.font.as_mut()) {
                join(font);
            }
        }
        if let Some(font) = self.verification.as_mut().and_then(|v| v.font.as_mut()) {
            join(font);
        }
    }

    /// The gate in front of generation: at least one field, every field
    /// placed and bound, and complete email settings when email is on.
    pub fn check_ready(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SelloError::NotReady("no fields defined".into()));
        }
        for field in &self.fields {
            if !field.is_placed() {
                return Err(SelloError::NotReady(format!(
                    "field {} ({}) has no position",
                    field.id, field.field_type
                )));
            }
            if !field.is_bound() {
                return Err(SelloError::NotReady(format!(
                    "field {} ({}) is not bound to a data column",
                    field.id, field.field_type
                )));
            }
        }
        if let Some(email) = &self.email {
            email.check_complete()?;
        }
        Ok(())
    }
}

/// `certificates_<YYYYmmdd_HHMMSS>` in the current directory.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(format!(
        "certificates_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}
