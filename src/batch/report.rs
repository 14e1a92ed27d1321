//! Run results.

use crate::error::{DispatchError, LinkOverlayError, RowError};
use std::fmt;
use std::path::PathBuf;

/// Errors shown in a summary before the rest are collapsed.
pub const SUMMARY_ERROR_LIMIT: usize = 5;

/// Where a row got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStage {
    Pending,
    Composed,
    Converted,
    LinksApplied,
    Written,
    EmailSent,
    EmailFailed,
    EmailSkipped,
    Done,
    Failed,
}

/// Per-row trace.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    pub index: usize,
    pub label: String,
    pub path: Option<PathBuf>,
    pub stages: Vec<RowStage>,
}

impl RowReport {
    pub fn new(index: usize, label: String) -> Self {
        Self {
            index,
            label,
            path: None,
            stages: vec![RowStage::Pending],
        }
    }

    pub fn enter(&mut self, stage: RowStage) {
        log::debug!("row {} ({}): {:?}", self.index + 1, self.label, stage);
        self.stages.push(stage);
    }

    pub fn last_stage(&self) -> RowStage {
        self.stages.last().copied().unwrap_or(RowStage::Pending)
    }
}

#[derive(Debug)]
pub struct RowFailure {
    pub index: usize,
    pub label: String,
    pub error: RowError,
}

#[derive(Debug)]
pub struct LinkWarning {
    pub index: usize,
    pub error: LinkOverlayError,
}

#[derive(Debug)]
pub struct EmailFailure {
    /// Recipient name, or the file label when the row has no name.
    pub label: String,
    /// The address tried, when there was a usable one.
    pub recipient: Option<String>,
    pub error: DispatchError,
}

impl fmt::Display for EmailFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.recipient {
            Some(to) => write!(f, "{} ({}): {}", self.label, to, self.error),
            None => write!(f, "{}: {}", self.label, self.error),
        }
    }
}

/// Everything a run produced, in row order.
#[derive(Debug, Default)]
pub struct GenerationResult {
    /// Rows in the data source.
    pub total: usize,
    /// Rows that were started.
    pub attempted: usize,
    pub succeeded: usize,
    pub files: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
    pub link_warnings: Vec<LinkWarning>,
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub email_failures: Vec<EmailFailure>,
    pub rows: Vec<RowReport>,
    pub cancelled: bool,
}

impl GenerationResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn email_attempted(&self) -> bool {
        self.emails_sent + self.emails_failed > 0
    }
}

fn write_capped<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for item in items.iter().take(SUMMARY_ERROR_LIMIT) {
        writeln!(f, "  {}", item)?;
    }
    if items.len() > SUMMARY_ERROR_LIMIT {
        writeln!(f, "  ... and {} more", items.len() - SUMMARY_ERROR_LIMIT)?;
    }
    Ok(())
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.index + 1, self.label, self.error)
    }
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generated {} of {} certificates",
            self.succeeded, self.attempted
        )?;
        if self.cancelled {
            writeln!(f, "Cancelled after {} of {} rows", self.attempted, self.total)?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failed rows:")?;
            write_capped(f, &self.failures)?;
        }
        if !self.link_warnings.is_empty() {
            writeln!(
                f,
                "{} certificates were written without links",
                self.link_warnings.len()
            )?;
        }
        if self.email_attempted() {
            writeln!(f, "Emails sent: {}", self.emails_sent)?;
            writeln!(f, "Emails failed: {}", self.emails_failed)?;
            if !self.email_failures.is_empty() {
                writeln!(f, "Email errors:")?;
                write_capped(f, &self.email_failures)?;
            }
        }
        Ok(())
    }
}
