//! # Batch Generation
//!
//! Turns every data row into a certificate PDF:
//!
//! ```text
//! resolve → compose → convert → links → write → email
//! ```
//!
//! Preconditions are checked once before the first row and are the only
//! errors that abort a run. After that, each row succeeds or fails on its own
//! and the outcome is recorded in the [`GenerationResult`].
//!
//! Rendering can run on the rayon pool. Writing, emailing and progress
//! reporting always happen one row at a time in row order, so output names,
//! email order and progress counts are the same either way.

pub mod label;
pub mod output;
pub mod report;

pub use label::{file_name, row_label, sanitize_label};
pub use output::write_atomic;
pub use report::{
    EmailFailure, GenerationResult, LinkWarning, RowFailure, RowReport, RowStage,
};

use crate::data::DataSource;
use crate::email::{Dispatcher, EmailSettings, OutgoingEmail, validate_recipient};
use crate::error::{DispatchError, LinkOverlayError, Result, RowError, SelloError};
use crate::model::{FieldSet, VerificationConfig};
use crate::pdf::{apply_links, image_to_pdf, pdf_bytes};
use crate::render::{ResolvedRow, Template, compose, resolve_row};
use crate::text::FontLibrary;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop request. Checked before each row starts; rows already being
/// rendered are finished.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Email delivery for a run.
#[derive(Clone, Copy)]
pub struct EmailJob<'a> {
    pub settings: &'a EmailSettings,
    pub dispatcher: &'a dyn Dispatcher,
}

/// Called after each row reaches its final state with `(completed, total)`.
pub type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + Send + 'a>;

pub struct BatchGenerator<'a> {
    template: &'a Template,
    fields: &'a FieldSet,
    verification: Option<&'a VerificationConfig>,
    email: Option<EmailJob<'a>>,
    fonts: FontLibrary,
    parallel: bool,
    cancel: CancelFlag,
    progress: Option<ProgressFn<'a>>,
}

/// A row after the CPU-bound steps.
struct RenderedRow {
    stages: Vec<RowStage>,
    outcome: std::result::Result<Vec<u8>, RowError>,
    link_warning: Option<LinkOverlayError>,
}

impl<'a> BatchGenerator<'a> {
    pub fn new(template: &'a Template, fields: &'a FieldSet) -> Self {
        Self {
            template,
            fields,
            verification: None,
            email: None,
            fonts: FontLibrary::new(),
            parallel: false,
            cancel: CancelFlag::new(),
            progress: None,
        }
    }

    pub fn verification(mut self, verification: Option<&'a VerificationConfig>) -> Self {
        self.verification = verification;
        self
    }

    pub fn email(mut self, job: EmailJob<'a>) -> Self {
        self.email = Some(job);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn on_progress(mut self, progress: impl FnMut(usize, usize) + Send + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Check everything that must hold before the first row is touched.
    ///
    /// All missing columns are reported together, each once, in the order the
    /// fields reference them.
    pub fn validate(&self, data: &dyn DataSource) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SelloError::NotReady("no fields defined".into()));
        }
        for field in self.fields {
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
        if let Some(job) = &self.email {
            job.settings.check_complete()?;
        }

        let email_column = self.email.as_ref().map(|job| job.settings.email_column.as_str());
        let mut missing: Vec<String> = Vec::new();
        for column in self
            .fields
            .iter()
            .map(|f| f.data_column.as_str())
            .chain(email_column)
        {
            if !data.has_column(column) && !missing.iter().any(|m| m == column) {
                missing.push(column.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(SelloError::MissingColumns(missing));
        }
        Ok(())
    }

    /// Render every row of `data` into `output_dir`.
    pub async fn generate(
        &mut self,
        data: &dyn DataSource,
        output_dir: &Path,
    ) -> Result<GenerationResult> {
        self.validate(data)?;

        if let Some(v) = self.verification.filter(|v| v.is_active()) {
            if !data.has_column(&v.uid_column) {
                log::warn!(
                    "Verification column '{}' not found; certificates will have no verification ID",
                    v.uid_column
                );
            }
        }

        std::fs::create_dir_all(output_dir)?;

        let total = data.row_count();
        let mut result = GenerationResult::new(total);
        log::info!(
            "Generating {} certificates into {}",
            total,
            output_dir.display()
        );

        let chunk_size = if self.parallel {
            rayon::current_num_threads().max(1) * 2
        } else {
            1
        };

        let mut start = 0;
        while start < total {
            if self.cancel.is_cancelled() {
                log::info!("Cancelled after {} of {} rows", start, total);
                result.cancelled = true;
                break;
            }
            let end = (start + chunk_size).min(total);

            let rows: Vec<ResolvedRow<'_>> = (start..end)
                .map(|i| resolve_row(self.fields, self.verification, data, i))
                .collect();

            let (template, fonts) = (self.template, &self.fonts);
            let rendered: Vec<RenderedRow> = if self.parallel {
                rows.par_iter().map(|row| render_row(template, fonts, row)).collect()
            } else {
                rows.iter().map(|row| render_row(template, fonts, row)).collect()
            };

            for (row, rendered) in rows.iter().zip(rendered) {
                self.finish_row(row, rendered, data, output_dir, &mut result).await;
                if let Some(progress) = self.progress.as_mut() {
                    progress(result.attempted, total);
                }
            }
            start = end;
        }

        log::info!(
            "Finished: {} of {} certificates written, {} failed",
            result.succeeded,
            result.attempted,
            result.failures.len()
        );
        Ok(result)
    }

    /// Write, email and record one rendered row.
    async fn finish_row(
        &self,
        row: &ResolvedRow<'_>,
        rendered: RenderedRow,
        data: &dyn DataSource,
        output_dir: &Path,
        result: &mut GenerationResult,
    ) {
        let label = row_label(row, data);
        let mut report = RowReport::new(row.index, label.clone());
        for stage in rendered.stages {
            report.enter(stage);
        }
        result.attempted += 1;

        if let Some(error) = rendered.link_warning {
            result.link_warnings.push(LinkWarning {
                index: row.index,
                error,
            });
        }

        let written = rendered
            .outcome
            .and_then(|bytes| write_atomic(output_dir, &file_name(&label, row.index), &bytes));

        match written {
            Err(error) => {
                log::warn!("Row {} ({}) failed: {}", row.index + 1, label, error);
                report.enter(RowStage::Failed);
                result.failures.push(RowFailure {
                    index: row.index,
                    label,
                    error,
                });
            }
            Ok(path) => {
                report.enter(RowStage::Written);
                result.files.push(path.clone());
                result.succeeded += 1;

                let stage = match &self.email {
                    None => RowStage::EmailSkipped,
                    Some(job) => match dispatch_row(job, row, data, &label, &path).await {
                        Ok(()) => {
                            result.emails_sent += 1;
                            RowStage::EmailSent
                        }
                        Err(failure) => {
                            log::warn!("Email for row {} failed: {}", row.index + 1, failure);
                            result.emails_failed += 1;
                            result.email_failures.push(failure);
                            RowStage::EmailFailed
                        }
                    },
                };
                report.enter(stage);
                report.enter(RowStage::Done);
                report.path = Some(path);
            }
        }
        result.rows.push(report);
    }
}

/// Compose, convert and link one row. Pure apart from font loading, so it can
/// run on any thread.
fn render_row(template: &Template, fonts: &FontLibrary, row: &ResolvedRow<'_>) -> RenderedRow {
    let mut stages = Vec::new();
    let failed = |stages: Vec<RowStage>, error: RowError| RenderedRow {
        stages,
        outcome: Err(error),
        link_warning: None,
    };

    // A panicking row must not take the batch down with it
    let image = match panic::catch_unwind(AssertUnwindSafe(|| compose(template, row, fonts))) {
        Ok(image) => image,
        Err(_) => return failed(stages, RowError::Render("renderer panicked".into())),
    };
    stages.push(RowStage::Composed);

    let document = match image_to_pdf(&image) {
        Ok(document) => document,
        Err(e) => return failed(stages, RowError::Convert(e.to_string())),
    };
    stages.push(RowStage::Converted);

    let links = row.links();
    let (mut document, link_warning) = apply_links(document, &links, template.size());
    if !links.is_empty() && link_warning.is_none() {
        stages.push(RowStage::LinksApplied);
    }

    RenderedRow {
        stages,
        outcome: pdf_bytes(&mut document).map_err(|e| RowError::Convert(e.to_string())),
        link_warning,
    }
}

async fn dispatch_row(
    job: &EmailJob<'_>,
    row: &ResolvedRow<'_>,
    data: &dyn DataSource,
    label: &str,
    path: &Path,
) -> std::result::Result<(), EmailFailure> {
    let name = row.recipient_name().unwrap_or(label).to_string();
    let raw = data
        .cell(row.index, &job.settings.email_column)
        .unwrap_or_default();

    let to = validate_recipient(raw).map_err(|error| EmailFailure {
        label: name.clone(),
        recipient: None,
        error,
    })?;
    let failure = |error: DispatchError| EmailFailure {
        label: name.clone(),
        recipient: Some(to.to_string()),
        error,
    };

    let email = OutgoingEmail::with_file(
        to,
        &job.settings.subject,
        job.settings.personalize(row.recipient_name()),
        path,
    )
    .map_err(&failure)?;
    job.dispatcher.send(&email).await.map_err(failure)
}

/// Run a whole batch with default options.
pub async fn generate(
    template: &Template,
    data: &dyn DataSource,
    fields: &FieldSet,
    verification: Option<&VerificationConfig>,
    output_dir: &Path,
    email: Option<EmailJob<'_>>,
) -> Result<GenerationResult> {
    let mut generator = BatchGenerator::new(template, fields).verification(verification);
    if let Some(job) = email {
        generator = generator.email(job);
    }
    generator.generate(data, output_dir).await
}

/// Output directory for a job: the configured one, or a timestamped default.
pub fn output_dir_or_default(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::model::default_output_dir)
}
