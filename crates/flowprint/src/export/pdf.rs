//! Single-page PDF wrapping a rendered bitmap.
//!
//! The page is sized to the bitmap's logical pixel dimensions, one CSS pixel
//! being 0.75 pt, and the image fills it completely. Pixels are written as
//! zlib-compressed 8-bit RGB.

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use log::debug;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use flowprint_core::geometry::Size;

use super::raster::Bitmap;
use crate::error::ExportError;

/// Points per CSS pixel.
pub const POINTS_PER_PIXEL: f32 = 0.75;

const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// Page geometry for a bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    size: Size,
}

impl PageLayout {
    /// Lays out a page for content of `logical_size` CSS pixels.
    pub fn for_logical_size(logical_size: Size) -> Self {
        Self {
            size: logical_size.scale(POINTS_PER_PIXEL),
        }
    }

    /// Page size in points.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Landscape when wider than tall; square pages are portrait.
    pub fn is_landscape(&self) -> bool {
        self.size.is_landscape()
    }
}

/// Encodes `bitmap` as a one-page PDF document.
pub fn encode_document(bitmap: &Bitmap) -> Result<Vec<u8>, ExportError> {
    let layout = PageLayout::for_logical_size(bitmap.logical_size());
    let page_size = layout.size();

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&bitmap.to_rgb())
        .map_err(|err| ExportError::Encoding(format!("image compression failed: {err}")))?;
    let compressed = encoder
        .finish()
        .map_err(|err| ExportError::Encoding(format!("image compression failed: {err}")))?;

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, page_size.width(), page_size.height()));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(IMAGE_NAME, image_id);
    page.finish();

    let mut image = pdf.image_xobject(image_id, &compressed);
    image.filter(Filter::FlateDecode);
    image.width(bitmap.width() as i32);
    image.height(bitmap.height() as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    // Scale the unit square image to the full page
    let mut content = Content::new();
    content.save_state();
    content.transform([page_size.width(), 0.0, 0.0, page_size.height(), 0.0, 0.0]);
    content.x_object(IMAGE_NAME);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    debug!(
        page_width = page_size.width(),
        page_height = page_size.height(),
        landscape = layout.is_landscape(),
        image_bytes = compressed.len();
        "PDF document assembled"
    );

    Ok(pdf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_layout_points() {
        let layout = PageLayout::for_logical_size(Size::new(780.0, 200.0));
        assert_eq!(layout.size(), Size::new(585.0, 150.0));
        assert!(layout.is_landscape());
    }

    #[test]
    fn test_page_layout_portrait() {
        assert!(!PageLayout::for_logical_size(Size::new(200.0, 780.0)).is_landscape());
        assert!(!PageLayout::for_logical_size(Size::new(100.0, 100.0)).is_landscape());
    }
}
