//! Template image and text drawing primitives.

use crate::error::{Result, SelloError};
use crate::model::{Anchor, Rgb};
use crate::text::{Face, TextRaster, render_text};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Immutable template raster. Every row renders onto a fresh copy.
#[derive(Debug, Clone)]
pub struct Template {
    image: RgbaImage,
}

impl Template {
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| SelloError::Template(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_image(image.to_rgba8()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Solid-color template, used for test sends and previews without artwork.
    pub fn blank(width: u32, height: u32, color: Rgb) -> Self {
        let [r, g, b] = color.0;
        Self::from_image(RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])))
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn fresh_copy(&self) -> RgbaImage {
        self.image.clone()
    }
}

/// Blend a coverage raster onto `image` with its top-left corner at `origin`.
///
/// Each channel moves toward `color` by the coverage amount. Pixels falling
/// outside the image are clipped.
pub fn blend_coverage(image: &mut RgbaImage, raster: &TextRaster, origin: (i32, i32), color: Rgb) {
    let (img_w, img_h) = image.dimensions();
    let (ox, oy) = origin;

    for ry in 0..raster.height {
        let y = oy + ry as i32;
        if y < 0 || y >= img_h as i32 {
            continue;
        }
        for rx in 0..raster.width {
            let x = ox + rx as i32;
            if x < 0 || x >= img_w as i32 {
                continue;
            }
            let coverage = raster.coverage_at(rx, ry);
            if coverage <= 0.0 {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                pixel[c] = lerp(pixel[c], color.0[c], coverage);
            }
            pixel[3] = lerp(pixel[3], 255, coverage);
        }
    }
}

#[inline]
fn lerp(base: u8, target: u8, t: f32) -> u8 {
    let v = base as f32 + (target as f32 - base as f32) * t.clamp(0.0, 1.0);
    v.round().clamp(0.0, 255.0) as u8
}

/// Draw `text` centered on `anchor` in both axes. Returns the drawn size.
pub fn draw_centered(
    image: &mut RgbaImage,
    text: &str,
    face: &Face,
    size: u32,
    anchor: Anchor,
    color: Rgb,
) -> (u32, u32) {
    let raster = render_text(text, face, size);
    let origin = (
        anchor.x - (raster.width / 2) as i32,
        anchor.y - (raster.height / 2) as i32,
    );
    blend_coverage(image, &raster, origin, color);
    raster.size()
}

/// Draw `text` centered horizontally on `center_x`, with its top at
/// `anchor_y + floor(0.8 * height)`.
pub fn draw_below(
    image: &mut RgbaImage,
    text: &str,
    face: &Face,
    size: u32,
    anchor: Anchor,
    color: Rgb,
) -> (u32, u32) {
    let raster = render_text(text, face, size);
    let origin = (
        anchor.x - (raster.width / 2) as i32,
        anchor.y + (raster.height as f32 * 0.8).floor() as i32,
    );
    blend_coverage(image, &raster, origin, color);
    raster.size()
}
