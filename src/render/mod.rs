//! # Rendering Module
//!
//! Draws resolved rows onto the template raster.
//!
//! - [`canvas`]: template image, coverage blending and anchored text drawing
//! - [`composer`]: row resolution and per-row composition

pub mod canvas;
pub mod composer;

pub use canvas::{Template, blend_coverage, draw_below, draw_centered};
pub use composer::{
    NA_TEXT, ResolvedField, ResolvedRow, ResolvedVerification, compose, resolve_row,
    resolve_value, sample_row,
};
