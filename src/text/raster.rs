//! Text rasterization and measurement.
//!
//! Renders a string to an anti-aliased coverage buffer cropped to its ink
//! bounds. Measurement is the size of that same buffer, so text centered by
//! its measured size is centered by its actual pixels.

use super::font::Face;
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use spleen_font::{FONT_12X24, PSF2Font};

const SPLEEN_W: usize = 12;
const SPLEEN_H: usize = 24;

/// Rendered text as a coverage buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRaster {
    pub width: u32,
    pub height: u32,
    /// Row-major coverage: 0.0 = untouched, 1.0 = full ink.
    pub coverage: Vec<f32>,
}

impl TextRaster {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            coverage: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn coverage_at(&self, x: u32, y: u32) -> f32 {
        self.coverage[(y * self.width + x) as usize]
    }
}

/// Render `text` at `size` pixels per em.
///
/// Text with no visible ink (empty, whitespace) yields an empty raster.
pub fn render_text(text: &str, face: &Face, size: u32) -> TextRaster {
    if size == 0 || text.is_empty() {
        return TextRaster::empty();
    }
    match face {
        Face::Builtin => render_builtin(text, size as usize),
        Face::Outline(font) => render_outline(text, font, size as f32),
    }
}

/// Ink width and height of `text`.
pub fn measure(text: &str, face: &Face, size: u32) -> (u32, u32) {
    render_text(text, face, size).size()
}

// ============================================================================
// OUTLINE FONTS
// ============================================================================

/// ab_glyph scales by line height (ascent - descent); convert from em size.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

fn render_outline(text: &str, font: &FontArc, size: f32) -> TextRaster {
    let scale = em_scale(font, size);
    let scaled = font.as_scaled(scale);
    let baseline_y = scaled.ascent();

    let mut outlined = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, point(caret_x, baseline_y));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);

        if let Some(glyph) = font.outline_glyph(glyph) {
            outlined.push(glyph);
        }
    }

    if outlined.is_empty() {
        return TextRaster::empty();
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    let width = (max_x - min_x).ceil().max(1.0) as usize;
    let height = (max_y - min_y).ceil().max(1.0) as usize;
    let mut data = vec![0.0f32; width * height];

    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let off_x = (bounds.min.x - min_x) as i32;
        let off_y = (bounds.min.y - min_y) as i32;
        glyph.draw(|px, py, coverage| {
            let x = px as i32 + off_x;
            let y = py as i32 + off_y;
            if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                let idx = y as usize * width + x as usize;
                data[idx] = (data[idx] + coverage).min(1.0);
            }
        });
    }

    crop_to_ink(width, height, &data)
}

// ============================================================================
// BUILT-IN BITMAP FONT
// ============================================================================

/// Spleen 12x24 scaled nearest-neighbour so the cell height equals `size`.
fn render_builtin(text: &str, size: usize) -> TextRaster {
    let mut spleen = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(_) => {
            log::warn!("Built-in font failed to load");
            return TextRaster::empty();
        }
    };

    let cell_h = size;
    let cell_w = ((SPLEEN_W * size + SPLEEN_H / 2) / SPLEEN_H).max(1);
    let chars: Vec<char> = text.chars().collect();
    let width = cell_w * chars.len();
    let mut data = vec![0.0f32; width * cell_h];

    for (i, ch) in chars.iter().enumerate() {
        let mut src = [false; SPLEEN_W * SPLEEN_H];
        let mut utf8 = [0u8; 4];

        if let Some(glyph) = spleen.glyph_for_utf8(ch.encode_utf8(&mut utf8).as_bytes()) {
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < SPLEEN_H && col_x < SPLEEN_W {
                        src[row_y * SPLEEN_W + col_x] = on;
                    }
                }
            }
        } else {
            draw_box(&mut src);
        }

        let cell_x = i * cell_w;
        for dy in 0..cell_h {
            let sy = dy * SPLEEN_H / cell_h;
            for dx in 0..cell_w {
                let sx = dx * SPLEEN_W / cell_w;
                if src[sy * SPLEEN_W + sx] {
                    data[dy * width + cell_x + dx] = 1.0;
                }
            }
        }
    }

    crop_to_ink(width, cell_h, &data)
}

/// Outline box for characters the bitmap font lacks.
fn draw_box(cell: &mut [bool; SPLEEN_W * SPLEEN_H]) {
    for x in 2..SPLEEN_W - 2 {
        cell[4 * SPLEEN_W + x] = true;
        cell[(SPLEEN_H - 5) * SPLEEN_W + x] = true;
    }
    for y in 4..SPLEEN_H - 4 {
        cell[y * SPLEEN_W + 2] = true;
        cell[y * SPLEEN_W + SPLEEN_W - 3] = true;
    }
}

// ============================================================================
// CROPPING
// ============================================================================

/// Coverage at or below half an 8-bit step rounds away when blended.
const MIN_INK: f32 = 0.5 / 255.0;

fn crop_to_ink(width: usize, height: usize, data: &[f32]) -> TextRaster {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for y in 0..height {
        for x in 0..width {
            if data[y * width + x] > MIN_INK {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return TextRaster::empty();
    };

    let w = x1 - x0 + 1;
    let h = y1 - y0 + 1;
    let mut coverage = Vec::with_capacity(w * h);
    for y in y0..=y1 {
        coverage.extend_from_slice(&data[y * width + x0..=y * width + x1]);
    }

    TextRaster {
        width: w as u32,
        height: h as u32,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const OUTLINE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/DejaVuSans.ttf");

    fn outline_face() -> Face {
        Face::load(Path::new(OUTLINE_FONT)).unwrap()
    }

    #[test]
    fn test_builtin_renders_ink() {
        let r = render_text("N/A", &Face::Builtin, 24);
        assert!(r.width > 0);
        assert!(r.height > 0 && r.height <= 24);
        assert_eq!(r.coverage.len(), (r.width * r.height) as usize);
        assert!(r.coverage.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_builtin_scales_with_size() {
        let (w_small, h_small) = measure("Ada", &Face::Builtin, 24);
        let (w_big, h_big) = measure("Ada", &Face::Builtin, 72);
        assert!(h_big > h_small * 2);
        assert!(w_big > w_small * 2);
    }

    #[test]
    fn test_cropped_to_ink() {
        let r = render_text("I", &Face::Builtin, 48);
        // Edges of the crop must carry ink
        let top_row = (0..r.width).any(|x| r.coverage_at(x, 0) > 0.0);
        let bottom_row = (0..r.width).any(|x| r.coverage_at(x, r.height - 1) > 0.0);
        let left_col = (0..r.height).any(|y| r.coverage_at(0, y) > 0.0);
        let right_col = (0..r.height).any(|y| r.coverage_at(r.width - 1, y) > 0.0);
        assert!(top_row && bottom_row && left_col && right_col);
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(render_text("", &Face::Builtin, 24).is_empty());
        assert!(render_text("   ", &Face::Builtin, 24).is_empty());
        assert!(render_text("x", &Face::Builtin, 0).is_empty());
    }

    #[test]
    fn test_unknown_char_draws_box() {
        let r = render_text("\u{10FFFD}", &Face::Builtin, 24);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_measure_matches_render() {
        let r = render_text("Grace Hopper", &Face::Builtin, 30);
        assert_eq!(measure("Grace Hopper", &Face::Builtin, 30), (r.width, r.height));
    }

    #[test]
    fn test_outline_font_anti_aliased() {
        let face = outline_face();
        let r = render_text("Smooth", &face, 48);
        assert!(r.width > 48);
        assert!(r.height > 20 && r.height <= 60);
        assert!(r.coverage.iter().any(|&v| v > 0.01 && v < 0.99));
    }

    #[test]
    fn test_outline_font_kerning_width() {
        let face = outline_face();
        let (w1, _) = measure("AV", &face, 64);
        let (w_a, _) = measure("A", &face, 64);
        let (w_v, _) = measure("V", &face, 64);
        assert!(w1 <= w_a + w_v + 8);
    }
}
