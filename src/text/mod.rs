//! Text metrics and rasterization.

pub mod font;
pub mod raster;

pub use font::{Face, FontLibrary};
pub use raster::{TextRaster, measure, render_text};
