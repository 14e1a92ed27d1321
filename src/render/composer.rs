//! Per-row composition.
//!
//! Rendering a row is two steps. [`resolve_row`] turns a data row into the
//! exact strings that will be drawn; [`compose`] draws them onto a copy of the
//! template. File labels, link regions and email personalization all read the
//! resolved row, so they always agree with the pixels.

use super::canvas::{Template, draw_below, draw_centered};
use crate::data::DataSource;
use crate::model::{FieldSet, FieldType, Rgb, TextField, VerificationConfig};
use crate::pdf::LinkSpec;
use crate::text::FontLibrary;
use image::RgbaImage;

/// Drawn in place of a missing value.
pub const NA_TEXT: &str = "N/A";

/// UID shown when previewing without data.
pub const SAMPLE_UID: &str = "SAMPLE-UID-0001";

/// Trimmed cell value, or `N/A` when the cell is missing or blank.
pub fn resolve_value(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => NA_TEXT.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub field: &'a TextField,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedVerification<'a> {
    pub config: &'a VerificationConfig,
    pub uid: String,
}

impl ResolvedVerification<'_> {
    pub fn text(&self) -> String {
        VerificationConfig::text(&self.uid)
    }

    pub fn url(&self) -> String {
        self.config.url(&self.uid)
    }
}

/// One data row, resolved to drawable strings.
#[derive(Debug, Clone)]
pub struct ResolvedRow<'a> {
    pub index: usize,
    pub fields: Vec<ResolvedField<'a>>,
    /// Present only when verification is active and the row has a UID.
    pub verification: Option<ResolvedVerification<'a>>,
}

impl<'a> ResolvedRow<'a> {
    /// Resolved text of every Name field, in field order.
    pub fn name_values(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|r| r.field.field_type == FieldType::Name)
            .map(|r| r.text.as_str())
    }

    /// The recipient's name: the last Name field.
    pub fn recipient_name(&self) -> Option<&str> {
        self.name_values().last()
    }

    /// Clickable regions for this row: linked fields, then verification.
    pub fn links(&self) -> Vec<LinkSpec> {
        let mut links: Vec<LinkSpec> = self
            .fields
            .iter()
            .filter(|r| !r.text.is_empty())
            .filter_map(|r| {
                let url = r.field.link()?;
                let position = r.field.anchor?;
                Some(LinkSpec {
                    position,
                    url: url.to_string(),
                    font_size: r.field.font_size,
                })
            })
            .collect();

        if let Some(v) = &self.verification {
            if let Some(position) = v.config.anchor {
                links.push(LinkSpec {
                    position,
                    url: v.url(),
                    font_size: v.config.font_size,
                });
            }
        }
        links
    }
}

/// Resolve row `row` of `data` against the configured fields.
///
/// A verification UID column absent from `data` leaves verification inactive
/// for the row.
pub fn resolve_row<'a>(
    fields: &'a FieldSet,
    verification: Option<&'a VerificationConfig>,
    data: &dyn DataSource,
    row: usize,
) -> ResolvedRow<'a> {
    let resolved = fields
        .iter()
        .map(|field| ResolvedField {
            field,
            text: resolve_value(data.cell(row, &field.data_column)),
        })
        .collect();

    let verification = verification
        .filter(|v| v.is_active() && data.has_column(&v.uid_column))
        .and_then(|config| {
            let uid = data.cell(row, &config.uid_column)?.trim();
            (!uid.is_empty()).then(|| ResolvedVerification {
                config,
                uid: uid.to_string(),
            })
        });

    ResolvedRow {
        index: row,
        fields: resolved,
        verification,
    }
}

/// A row made of each field type's sample text, for previews without data.
pub fn sample_row<'a>(
    fields: &'a FieldSet,
    verification: Option<&'a VerificationConfig>,
) -> ResolvedRow<'a> {
    ResolvedRow {
        index: 0,
        fields: fields
            .iter()
            .map(|field| ResolvedField {
                field,
                text: field.field_type.sample_text().to_string(),
            })
            .collect(),
        verification: verification
            .filter(|v| v.is_active())
            .map(|config| ResolvedVerification {
                config,
                uid: SAMPLE_UID.to_string(),
            }),
    }
}

/// Draw a resolved row onto a fresh copy of `template`.
///
/// Order: fields, then link subtexts, then the verification line. Fields
/// without a position are skipped.
pub fn compose(template: &Template, row: &ResolvedRow<'_>, fonts: &FontLibrary) -> RgbaImage {
    let mut image = template.fresh_copy();

    for r in &row.fields {
        let Some(anchor) = r.field.anchor else {
            continue;
        };
        let face = fonts.resolve(r.field.font.as_deref());
        draw_centered(&mut image, &r.text, &face, r.field.font_size, anchor, r.field.color);
    }

    for r in &row.fields {
        let (Some(anchor), Some(_)) = (r.field.anchor, r.field.link()) else {
            continue;
        };
        let face = fonts.resolve(r.field.font.as_deref());
        draw_below(
            &mut image,
            &r.text,
            &face,
            r.field.link_subtext_size(),
            anchor,
            Rgb::LINK,
        );
    }

    if let Some(v) = &row.verification {
        if let Some(anchor) = v.config.anchor {
            let face = fonts.resolve(v.config.font.as_deref());
            draw_centered(
                &mut image,
                &v.text(),
                &face,
                v.config.render_size(),
                anchor,
                Rgb::LINK,
            );
        }
    }

    image
}
