mod orientation;
pub mod pdf;

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::model::BackgroundReference;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// How the background raster reaches the output document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssetDelivery {
    /// Copy (or extract) the raster next to the SVG and reference it by file name.
    #[default]
    Copy,
    /// Reference the source image where it is, by relative path.
    Reference,
    /// Embed the raster as a base64 PNG.
    Embed,
}

/// Command-line delivery switches as the legacy tool accepted them.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeliveryFlags {
    pub embed_images: bool,
    pub external_images: bool,
    pub copy_images: bool,
    pub no_copy_images: bool,
}

impl DeliveryFlags {
    /// `--embed-images` wins. `--no-copy-images`, or `--external-images`
    /// without `--copy-images`, references the source in place. Anything
    /// else copies.
    pub fn delivery(&self) -> AssetDelivery {
        if self.embed_images {
            AssetDelivery::Embed
        } else if self.no_copy_images || (self.external_images && !self.copy_images) {
            AssetDelivery::Reference
        } else {
            AssetDelivery::Copy
        }
    }
}

#[derive(Clone, Debug)]
pub struct BackgroundOptions {
    pub delivery: AssetDelivery,
    pub normalize_orientation: bool,
    pub page_number: usize,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        BackgroundOptions {
            delivery: AssetDelivery::Copy,
            normalize_orientation: true,
            page_number: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Paged,
    Raster,
}

/// Classify a background by its (case-insensitive) extension.
pub fn source_kind(path: &Path) -> Result<SourceKind, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => Ok(SourceKind::Paged),
        e if SUPPORTED_EXTENSIONS.contains(&e) => Ok(SourceKind::Raster),
        "" => Err(Error::UnsupportedBackgroundFormat("(none)".into())),
        e => Err(Error::UnsupportedBackgroundFormat(format!(".{e}"))),
    }
}

/// Result of compositing: the reference plus the file written beside the
/// output, if any.
#[derive(Debug)]
pub struct Composited {
    pub reference: BackgroundReference,
    pub asset: Option<PathBuf>,
}

pub fn composite(
    source: &Path,
    output_dir: &Path,
    options: &BackgroundOptions,
) -> Result<Composited, Error> {
    match source_kind(source)? {
        SourceKind::Paged => composite_pdf(source, output_dir, options),
        SourceKind::Raster => composite_image(source, output_dir, options),
    }
}

fn composite_pdf(
    source: &Path,
    output_dir: &Path,
    options: &BackgroundOptions,
) -> Result<Composited, Error> {
    log::info!("Pre-processing PDF: {} page {}", source.display(), options.page_number);
    let raster = pdf::render_page(source, options.page_number)?;

    if options.delivery == AssetDelivery::Embed {
        return Ok(Composited {
            reference: BackgroundReference::InlineBytes(encode_png(raster)?),
            asset: None,
        });
    }

    let name = pdf::page_asset_name(source, options.page_number);
    let dest = output_dir.join(&name);
    raster
        .save_with_format(&dest, image::ImageFormat::Png)
        .map_err(|e| Error::Image(format!("{}: {e}", dest.display())))?;
    log::info!("Extracted PDF page to: {}", dest.display());

    Ok(Composited {
        reference: BackgroundReference::Path(name),
        asset: Some(dest),
    })
}

fn composite_image(
    source: &Path,
    output_dir: &Path,
    options: &BackgroundOptions,
) -> Result<Composited, Error> {
    log::info!("Pre-processing image: {}", source.display());

    if options.delivery == AssetDelivery::Reference {
        if options.normalize_orientation {
            log::debug!("Orientation normalization skipped for in-place references");
        }
        let href = reference_path(source, output_dir);
        log::info!("Using relative path: {href}");
        return Ok(Composited {
            reference: BackgroundReference::Path(href),
            asset: None,
        });
    }

    // Held until the image has been copied or encoded; dropping it removes the temp file.
    let normalized = if options.normalize_orientation {
        match orientation::normalize(source) {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("{e}");
                log::warn!("Proceeding with original image");
                None
            }
        }
    } else {
        None
    };
    let working = normalized.as_ref().map_or(source, |n| n.path());

    match options.delivery {
        AssetDelivery::Embed => {
            let img = image::open(working)
                .map_err(|e| Error::Image(format!("{}: {e}", source.display())))?;
            Ok(Composited {
                reference: BackgroundReference::InlineBytes(encode_png(img.to_rgb8())?),
                asset: None,
            })
        }
        _ => {
            let (name, dest) = relocate_image(source, working, output_dir)?;
            Ok(Composited {
                reference: BackgroundReference::Path(name),
                asset: Some(dest),
            })
        }
    }
}

fn encode_png(raster: image::RgbImage) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(raster)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| Error::Image(e.to_string()))?;
    Ok(bytes)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `{stem}_oriented.{ext}`, used when the corrected image cannot take the
/// source's own name.
pub fn oriented_asset_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "background".to_string());
    match source.extension() {
        Some(ext) => format!("{stem}_oriented.{}", ext.to_string_lossy()),
        None => format!("{stem}_oriented"),
    }
}

/// Place `working` (the source, or its corrected copy) next to the output
/// and return its file name and path. The asset keeps the source's file name
/// so it never depends on a temp file; a corrected image whose source already
/// sits there goes under [`oriented_asset_name`] instead of overwriting it.
pub fn relocate_image(
    source: &Path,
    working: &Path,
    output_dir: &Path,
) -> Result<(String, PathBuf), Error> {
    let mut name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InputNotFound {
            what: "Background file",
            path: source.to_path_buf(),
        })?;
    let mut dest = output_dir.join(&name);

    if same_file(source, &dest) {
        if working == source {
            return Ok((name, dest));
        }
        name = oriented_asset_name(source);
        dest = output_dir.join(&name);
    }

    std::fs::copy(working, &dest).map_err(|e| Error::AssetCopyFailure {
        from: working.to_path_buf(),
        to: dest.clone(),
        source: e,
    })?;
    log::info!("Copied image to SVG directory: {}", dest.display());
    Ok((name, dest))
}

/// Path of `target` as seen from `base`, with `/` separators. Falls back to
/// the absolute path when the two share no root.
fn reference_path(target: &Path, base: &Path) -> String {
    let target_abs = target.canonicalize().unwrap_or_else(|_| target.to_path_buf());
    let Ok(base_abs) = base.canonicalize() else {
        return target_abs.to_string_lossy().into_owned();
    };
    match relative_path(&target_abs, &base_abs) {
        Some(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        None => {
            log::info!("Cannot create relative path, using absolute: {}", target_abs.display());
            target_abs.to_string_lossy().into_owned()
        }
    }
}

fn relative_path(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    match (target.first(), base.first()) {
        (Some(a), Some(b)) if a == b => {}
        _ => return None,
    }
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for c in &target[common..] {
        rel.push(c.as_os_str());
    }
    Some(rel)
}
