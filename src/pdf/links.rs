//! Clickable link regions.
//!
//! Link positions come from the template, whose origin is the top-left corner
//! with y growing downward. PDF user space starts bottom-left with y growing
//! upward. [`image_to_pdf_rect`] is the one place that conversion happens.
//!
//! Links are built as an overlay document holding invisible `/Link`
//! annotations, then merged onto the first page of the rendered document.

use crate::error::LinkOverlayError;
use crate::model::Anchor;
use lopdf::{Document, Object, ObjectId, dictionary};

/// One clickable region: centered on `position`, sized from `font_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    pub position: Anchor,
    pub url: String,
    pub font_size: u32,
}

/// Axis-aligned rectangle in template pixel space (`top < bottom`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Rectangle in PDF user space: lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl LinkSpec {
    /// Clickable area: at least 80x12 px, otherwise 6 and 1.6 times the font size.
    ///
    /// Edges sit on whole pixels; an odd width or height loses its extra pixel
    /// from the half-extent on both sides.
    pub fn region(&self) -> ImageRect {
        let width = (self.font_size as i64 * 6).max(80);
        let height = ((self.font_size as f32 * 1.6) as i64).max(12);
        let (x, y) = (self.position.x as i64, self.position.y as i64);
        ImageRect {
            left: (x - width / 2) as f32,
            top: (y - height / 2) as f32,
            right: (x + width / 2) as f32,
            bottom: (y + height / 2) as f32,
        }
    }
}

/// Flip a template-space rectangle into PDF space for a page `page_height` tall.
pub fn image_to_pdf_rect(rect: ImageRect, page_height: f32) -> PdfRect {
    PdfRect {
        llx: rect.left,
        lly: page_height - rect.bottom,
        urx: rect.right,
        ury: page_height - rect.top,
    }
}

/// A standalone one-page document carrying only the link annotations.
pub fn build_link_overlay(links: &[LinkSpec], page_size: (u32, u32)) -> Document {
    let (width, height) = page_size;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let annots: Vec<Object> = links
        .iter()
        .map(|link| {
            let r = image_to_pdf_rect(link.region(), height as f32);
            let id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Link",
                "Rect" => vec![
                    Object::Real(r.llx),
                    Object::Real(r.lly),
                    Object::Real(r.urx),
                    Object::Real(r.ury),
                ],
                "Border" => vec![0.into(), 0.into(), 0.into()],
                "A" => dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal(link.url.as_str()),
                },
            });
            Object::Reference(id)
        })
        .collect();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Annots" => annots,
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
    doc
}

fn first_page(doc: &Document) -> Result<ObjectId, LinkOverlayError> {
    doc.get_pages()
        .get(&1)
        .copied()
        .ok_or_else(|| LinkOverlayError("document has no pages".into()))
}

/// Move the overlay's annotations onto the first page of `base`.
///
/// Annotations already on the page are kept. The overlay's own page tree is
/// discarded.
pub fn merge_overlay(base: &mut Document, mut overlay: Document) -> Result<(), LinkOverlayError> {
    let base_page = first_page(base)?;

    overlay.renumber_objects_with(base.max_id + 1);
    let overlay_page = first_page(&overlay)?;
    let page_dict = overlay.get_dictionary(overlay_page)?;
    let new_annots = page_dict.get(b"Annots")?.as_array()?.clone();
    let parent = page_dict.get(b"Parent").and_then(Object::as_reference).ok();
    let root = overlay.trailer.get(b"Root").and_then(Object::as_reference).ok();
    for id in [Some(overlay_page), parent, root].into_iter().flatten() {
        overlay.objects.remove(&id);
    }

    let mut annots = match base.get_dictionary(base_page)?.get(b"Annots") {
        Ok(Object::Array(existing)) => existing.clone(),
        Ok(Object::Reference(id)) => base.get_object(*id)?.as_array()?.clone(),
        _ => Vec::new(),
    };
    annots.extend(new_annots);

    if overlay.max_id > base.max_id {
        base.max_id = overlay.max_id;
    }
    base.objects.extend(overlay.objects);
    base.get_object_mut(base_page)?
        .as_dict_mut()?
        .set("Annots", Object::Array(annots));
    Ok(())
}

/// Add `links` to the first page of `document`.
///
/// No links returns the document untouched. If the overlay cannot be merged
/// the untouched document comes back together with the reason.
pub fn apply_links(
    document: Document,
    links: &[LinkSpec],
    page_size: (u32, u32),
) -> (Document, Option<LinkOverlayError>) {
    if links.is_empty() {
        return (document, None);
    }

    let mut linked = document.clone();
    match merge_overlay(&mut linked, build_link_overlay(links, page_size)) {
        Ok(()) => (linked, None),
        Err(e) => {
            log::warn!("{}; keeping the document without links", e);
            (document, Some(e))
        }
    }
}

/// URI and PDF-space rectangle of every link annotation on the first page.
pub fn read_links(doc: &Document) -> Vec<(String, PdfRect)> {
    let Ok(page_id) = first_page(doc) else {
        return Vec::new();
    };
    let annots = match doc.get_dictionary(page_id).and_then(|p| p.get(b"Annots")) {
        Ok(Object::Array(a)) => a.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let number = |o: &Object| o.as_float().ok().or_else(|| o.as_i64().ok().map(|v| v as f32));

    annots
        .iter()
        .filter_map(|annot| {
            let dict = match annot {
                Object::Reference(id) => doc.get_dictionary(*id).ok()?,
                Object::Dictionary(d) => d,
                _ => return None,
            };
            if dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Link" {
                return None;
            }
            let action = match dict.get(b"A").ok()? {
                Object::Reference(id) => doc.get_dictionary(*id).ok()?,
                Object::Dictionary(d) => d,
                _ => return None,
            };
            let uri = match action.get(b"URI").ok()? {
                Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
                _ => return None,
            };
            let rect = dict.get(b"Rect").and_then(Object::as_array).ok()?;
            let [llx, lly, urx, ury] = rect.as_slice() else {
                return None;
            };
            Some((
                uri,
                PdfRect {
                    llx: number(llx)?,
                    lly: number(lly)?,
                    urx: number(urx)?,
                    ury: number(ury)?,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{image_to_pdf, pdf_bytes};
    use image::{Rgba, RgbaImage};

    fn page(width: u32, height: u32) -> Document {
        image_to_pdf(&RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))).unwrap()
    }

    fn link(x: i32, y: i32, url: &str, font_size: u32) -> LinkSpec {
        LinkSpec {
            position: Anchor::new(x, y),
            url: url.into(),
            font_size,
        }
    }

    #[test]
    fn test_region_size() {
        let r = link(400, 100, "u", 48).region();
        assert_eq!((r.right - r.left, r.bottom - r.top), (288.0, 76.0));

        let small = link(0, 0, "u", 5).region();
        assert_eq!((small.right - small.left, small.bottom - small.top), (80.0, 12.0));
    }

    #[test]
    fn test_region_edges_are_whole_pixels() {
        // 16px gives a 25px tall region, halved to 12 on each side
        let r = link(400, 100, "u", 16).region();
        assert_eq!(
            r,
            ImageRect {
                left: 352.0,
                top: 88.0,
                right: 448.0,
                bottom: 112.0,
            }
        );
    }

    #[test]
    fn test_image_to_pdf_rect_flips_y() {
        let rect = ImageRect {
            left: 256.0,
            top: 62.0,
            right: 544.0,
            bottom: 138.0,
        };
        let pdf = image_to_pdf_rect(rect, 600.0);
        assert_eq!(
            pdf,
            PdfRect {
                llx: 256.0,
                lly: 462.0,
                urx: 544.0,
                ury: 538.0
            }
        );
    }

    #[test]
    fn test_empty_links_leave_bytes_identical() {
        let mut original = page(120, 80);
        let before = pdf_bytes(&mut original).unwrap();
        let (mut after, warning) = apply_links(original, &[], (120, 80));
        assert!(warning.is_none());
        assert_eq!(pdf_bytes(&mut after).unwrap(), before);
    }

    #[test]
    fn test_links_land_on_first_page() {
        let (mut doc, warning) = apply_links(
            page(800, 600),
            &[
                link(400, 100, "https://example.com/a", 48),
                link(100, 550, "https://example.com/b?uid=X123", 14),
            ],
            (800, 600),
        );
        assert!(warning.is_none());

        let bytes = pdf_bytes(&mut doc).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);

        let links = read_links(&reloaded);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "https://example.com/a");
        assert_eq!(
            links[0].1,
            PdfRect {
                llx: 256.0,
                lly: 462.0,
                urx: 544.0,
                ury: 538.0
            }
        );
        assert_eq!(links[1].0, "https://example.com/b?uid=X123");
        // 84 x 22 centered on (100, 550)
        assert_eq!(
            links[1].1,
            PdfRect {
                llx: 58.0,
                lly: 39.0,
                urx: 142.0,
                ury: 61.0
            }
        );
    }

    #[test]
    fn test_existing_annotations_are_kept() {
        let (doc, _) = apply_links(page(200, 200), &[link(50, 50, "https://first", 10)], (200, 200));
        let (doc, warning) = apply_links(doc, &[link(150, 150, "https://second", 10)], (200, 200));
        assert!(warning.is_none());
        let uris: Vec<String> = read_links(&doc).into_iter().map(|(u, _)| u).collect();
        assert_eq!(uris, vec!["https://first", "https://second"]);
    }

    #[test]
    fn test_overlay_failure_returns_original() {
        let empty = Document::with_version("1.5");
        let before = pdf_bytes(&mut empty.clone()).unwrap();
        let (mut after, warning) = apply_links(empty, &[link(1, 1, "https://x", 10)], (10, 10));
        assert!(warning.is_some());
        assert_eq!(pdf_bytes(&mut after).unwrap(), before);
    }

    #[test]
    fn test_overlay_page_tree_is_not_merged() {
        let base = page(100, 100);
        let objects_before = base.objects.len();
        let (doc, _) = apply_links(base, &[link(50, 50, "https://x", 10)], (100, 100));
        // one annotation object added, nothing else
        assert_eq!(doc.objects.len(), objects_before + 1);
        assert_eq!(doc.get_pages().len(), 1);
    }
}
