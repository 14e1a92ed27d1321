//! Plain-data model: fields, verification overlay and job configuration.

pub mod field;
pub mod job;
pub mod verification;

pub use field::{Anchor, FieldSet, FieldType, Rgb, TextField, suggest_email_column};
pub use job::{JobConfig, default_output_dir};
pub use verification::{DEFAULT_VERIFY_URL, VerificationConfig};
