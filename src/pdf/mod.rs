//! PDF assembly: raster pages and link annotations.

pub mod links;
pub mod page;

pub use links::{
    ImageRect, LinkSpec, PdfRect, apply_links, build_link_overlay, image_to_pdf_rect,
    merge_overlay, read_links,
};
pub use page::{first_page_size, image_to_pdf, pdf_bytes};
