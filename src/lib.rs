//! # Sello - Certificate Generator Library
//!
//! Sello produces one PDF per data row by drawing row values onto a template
//! image. It provides:
//!
//! - **Field model**: typed text fields with stable ids, anchored in template pixels
//! - **Composition**: center-anchored text from outline fonts or the built-in bitmap face
//! - **PDF output**: one page per certificate, with clickable link regions
//! - **Batch runs**: per-row error bookkeeping, optional parallel rendering and cancellation
//! - **Email**: per-recipient delivery through an HTTP webhook
//!
//! ## Quick Start
//!
//! ```no_run
//! use sello::{
//!     batch,
//!     data::load_csv,
//!     model::{Anchor, FieldSet, FieldType},
//!     render::Template,
//! };
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), sello::SelloError> {
//! let template = Template::load(Path::new("template.png"))?;
//! let data = load_csv(Path::new("participants.csv"))?;
//!
//! let mut fields = FieldSet::new();
//! let name = fields.add(FieldType::Name);
//! name.data_column = "Name".into();
//! name.anchor = Some(Anchor::new(400, 100));
//!
//! let result = batch::generate(&template, &data, &fields, None, Path::new("out"), None).await?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Fields, verification overlay, job configuration |
//! | [`data`] | Tabular data sources and CSV loading |
//! | [`text`] | Font faces, rasterization and measurement |
//! | [`render`] | Template handling and per-row composition |
//! | [`pdf`] | Raster pages and link annotations |
//! | [`batch`] | The per-row generation loop and its report |
//! | [`email`] | Webhook email dispatch |
//! | [`error`] | Error types |

pub mod batch;
pub mod data;
pub mod email;
pub mod error;
pub mod model;
pub mod pdf;
pub mod render;
pub mod text;

// Re-exports for convenience
pub use batch::{BatchGenerator, CancelFlag, GenerationResult};
pub use error::SelloError;
pub use model::JobConfig;
