//! # Error Types
//!
//! Run-level errors abort a batch before any row is processed. Row-level and
//! dispatch errors are recorded in the [`GenerationResult`](crate::batch::GenerationResult)
//! and never stop the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sello operations
#[derive(Debug, Error)]
pub enum SelloError {
    /// Bound columns absent from the data source, de-duplicated in first-reference order
    #[error("Missing data columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Generation preconditions not met (no fields, unplaced field, incomplete email settings)
    #[error("Not ready to generate: {0}")]
    NotReady(String),

    /// Template image could not be loaded
    #[error("Template error: {0}")]
    Template(String),

    /// Data source could not be read
    #[error("Data error: {0}")]
    Data(String),

    /// Invalid job configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF assembly error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Email dispatch error (test email path)
    #[error("Email error: {0}")]
    Email(#[from] DispatchError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single row. Recorded, never fatal for the batch.
#[derive(Debug, Error)]
pub enum RowError {
    /// Font, metric or draw failure
    #[error("render failed: {0}")]
    Render(String),

    /// Raster to PDF conversion failure
    #[error("PDF conversion failed: {0}")]
    Convert(String),

    /// Filesystem failure writing the output document
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Link overlay could not be applied; the row falls back to the unlinked document.
#[derive(Debug, Clone, Error)]
#[error("link overlay failed: {0}")]
pub struct LinkOverlayError(pub String);

impl From<lopdf::Error> for LinkOverlayError {
    fn from(e: lopdf::Error) -> Self {
        LinkOverlayError(e.to_string())
    }
}

/// Email dispatch failure for one recipient.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Absent or syntactically invalid address; no network call was made
    #[error("Invalid email address: {0:?}")]
    InvalidRecipient(String),

    /// Webhook answered with a non-200 status
    #[error("HTTP Error {status}: {body}")]
    Http { status: u16, body: String },

    /// Webhook answered 200 but reported failure (or an unparseable body)
    #[error("{0}")]
    Rejected(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The attachment could not be read
    #[error("attachment error: {0}")]
    Attachment(#[from] std::io::Error),
}

pub type Result<T, E = SelloError> = std::result::Result<T, E>;
