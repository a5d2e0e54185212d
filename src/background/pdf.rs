use std::path::{Path, PathBuf};

use image::RgbImage;
use pdfium_render::prelude::*;

use crate::error::Error;

/// Pages are rasterized at 300 DPI (PDF user space is 72 units per inch).
pub const RENDER_SCALE: f32 = 300.0 / 72.0;

/// `{stem}_page_{N}.png`
pub fn page_asset_name(source: &Path, page_number: usize) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "background".to_string());
    format!("{stem}_page_{page_number}.png")
}

/// Zero-indexed `page` must be below `page_count`.
pub fn check_page(page: usize, page_count: usize) -> Result<(), Error> {
    if page >= page_count {
        return Err(Error::PageOutOfRange { page, page_count });
    }
    Ok(())
}

/// Library search order: `TEXTBOX_SVG_PDFIUM`, the working directory, then the system.
fn bind_pdfium() -> Result<Pdfium, Error> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(dir) = std::env::var("TEXTBOX_SVG_PDFIUM") {
        dirs.push(PathBuf::from(dir));
    }
    dirs.push(PathBuf::from("./"));

    for dir in &dirs {
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
        if let Ok(bindings) = Pdfium::bind_to_library(&lib) {
            log::debug!("Bound pdfium from {}", lib.display());
            return Ok(Pdfium::new(bindings));
        }
    }
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| Error::PdfRender(format!("cannot load the pdfium library: {e}")))
}

/// Rasterize one page. The document handle is closed before returning.
pub(crate) fn render_page(source: &Path, page_number: usize) -> Result<RgbImage, Error> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(source, None)
        .map_err(|e| Error::PdfRender(format!("{}: {e}", source.display())))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    check_page(page_number, page_count)?;

    let page = pages
        .get(page_number as PdfPageIndex)
        .map_err(|e| Error::PdfRender(format!("page {page_number}: {e}")))?;
    let bitmap = page
        .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE))
        .map_err(|e| Error::PdfRender(format!("render page {page_number}: {e}")))?;

    let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
    let rgba = image::RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
        .ok_or_else(|| Error::PdfRender(format!("page {page_number}: bitmap size mismatch")))?;
    log::debug!("Rendered page {page_number} of {page_count}: {width}x{height} px");

    Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
}
