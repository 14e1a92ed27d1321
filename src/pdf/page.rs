//! Raster to single-page PDF.
//!
//! The page is exactly the image: MediaBox `[0 0 w h]`, one point per pixel,
//! with the image drawn over the full box. Nothing time- or run-dependent is
//! written, so the same pixels always produce the same bytes.

use crate::error::Result;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;

/// Name the image XObject is registered under in the page resources.
const IMAGE_NAME: &str = "Im0";

/// Flatten RGBA over white into packed RGB bytes.
fn flatten_over_white(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((image.width() * image.height() * 3) as usize);
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for c in [r, g, b] {
            let v = (c as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            rgb.push(v as u8);
        }
    }
    rgb
}

/// Build a one-page document showing `image`.
pub fn image_to_pdf(image: &RgbaImage) -> Result<Document> {
    let (width, height) = image.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&flatten_over_white(image))?;
    let compressed = encoder.finish()?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    ));

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n", width, height, IMAGE_NAME);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

/// Serialize a document.
pub fn pdf_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// `(width, height)` of the first page's MediaBox.
pub fn first_page_size(doc: &Document) -> Option<(f32, f32)> {
    let page_id = *doc.get_pages().get(&1)?;
    let media_box = doc.get_dictionary(page_id).ok()?.get(b"MediaBox").ok()?.as_array().ok()?;
    let num = |o: &Object| o.as_float().ok().or_else(|| o.as_i64().ok().map(|v| v as f32));
    match media_box.as_slice() {
        [x0, y0, x1, y1] => Some((num(x1)? - num(x0)?, num(y1)? - num(y0)?)),
        _ => None,
    }
}
