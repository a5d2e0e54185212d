mod background;
mod error;
mod fonts;
mod layout;
mod model;
mod svg;

pub use background::pdf::{RENDER_SCALE, check_page, page_asset_name};
pub use background::{
    AssetDelivery, BackgroundOptions, Composited, DeliveryFlags, SUPPORTED_EXTENSIONS, SourceKind,
    composite, oriented_asset_name, relocate_image, source_kind,
};
pub use error::Error;
pub use fonts::{
    FONT_CANDIDATES, FONT_SIZE, FontHandle, FontResolver, GENERIC_FAMILY, TextExtent,
    font_directories,
};
pub use layout::{
    LEFT_MARGIN, LINE_SPACING, LineLayout, TEXT_PADDING, TOP_MARGIN, layout, split_lines,
    strip_terminator,
};
pub use model::{
    Anchor, BackgroundImage, BackgroundReference, DrawCommand, Page, PixelRect, Style, TextBlock,
};
pub use svg::{assemble, escape_xml};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where the metrics font comes from.
#[derive(Clone, Debug, Default)]
pub enum FontSelection {
    /// Search the font directories for the candidate list.
    #[default]
    Search,
    /// Load exactly this file; failure is fatal.
    File(PathBuf),
    /// Skip the search and use the built-in approximate metrics.
    Builtin,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub text_file: PathBuf,
    pub background_file: Option<PathBuf>,
    pub output_file: PathBuf,
    pub background: BackgroundOptions,
    pub font: FontSelection,
    /// Overrides the `font-family` written to the output; metrics are unaffected.
    pub font_family: Option<String>,
}

impl Options {
    pub fn new(text_file: impl Into<PathBuf>) -> Self {
        Options {
            text_file: text_file.into(),
            background_file: None,
            output_file: PathBuf::from("output.svg"),
            background: BackgroundOptions::default(),
            font: FontSelection::Search,
            font_family: None,
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct Report {
    pub output: PathBuf,
    pub lines: usize,
    pub text_blocks: usize,
    pub background_asset: Option<PathBuf>,
    pub font_family: String,
}

/// Directory that receives the SVG and any background asset.
pub fn output_dir(output_file: &Path) -> PathBuf {
    match output_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check inputs exist and the background type is recognized, before any work.
pub fn validate_inputs(text_file: &Path, background_file: Option<&Path>) -> Result<(), Error> {
    if !text_file.exists() {
        return Err(Error::InputNotFound {
            what: "Text file",
            path: text_file.to_path_buf(),
        });
    }
    if let Some(bg) = background_file {
        if !bg.exists() {
            return Err(Error::InputNotFound {
                what: "Background file",
                path: bg.to_path_buf(),
            });
        }
        source_kind(bg)?;
    }
    Ok(())
}

pub fn load_font(selection: &FontSelection) -> Result<FontHandle, Error> {
    match selection {
        FontSelection::Search => Ok(FontResolver::new().resolve()),
        FontSelection::File(path) => {
            let handle = FontHandle::from_file(path)?;
            log::info!("Using font file: {} ({})", handle.family(), path.display());
            Ok(handle)
        }
        FontSelection::Builtin => Ok(FontHandle::builtin()),
    }
}

/// Lay out `content` and serialize the page. Pure: no filesystem access.
pub fn render_svg(
    content: &str,
    background: Option<BackgroundImage>,
    font: &FontHandle,
    style: &Style,
) -> (String, LineLayout) {
    let page = Page::a4();
    let lines = split_lines(content);
    let line_layout = layout(&lines, font);
    let svg = assemble(&page, background.as_ref(), &line_layout.commands, style);
    (svg, line_layout)
}

/// Run the whole pipeline. The SVG is written once, after everything else
/// succeeded.
pub fn generate(options: &Options) -> Result<Report, Error> {
    let t0 = Instant::now();
    validate_inputs(&options.text_file, options.background_file.as_deref())?;

    let content = std::fs::read_to_string(&options.text_file).map_err(|e| Error::InvalidText {
        path: options.text_file.clone(),
        source: e,
    })?;

    let font = load_font(&options.font)?;
    let font_family = options
        .font_family
        .clone()
        .unwrap_or_else(|| font.family().to_string());
    let style = Style::new(font_family.clone());

    let out_dir = output_dir(&options.output_file);
    let page = Page::a4();
    let mut background_asset = None;
    let background = match &options.background_file {
        Some(source) => {
            let composited = composite(source, &out_dir, &options.background)?;
            background_asset = composited.asset;
            Some(BackgroundImage::full_page(composited.reference, &page))
        }
        None => None,
    };
    let t_background = t0.elapsed();

    let (svg, line_layout) = render_svg(&content, background, &font, &style);
    let t_render = t0.elapsed();

    std::fs::write(&options.output_file, &svg)?;
    let t_total = t0.elapsed();

    let lines = split_lines(&content).len();
    let text_blocks = line_layout.text_blocks().count();
    log::info!(
        "Timing: font+background={:.1}ms, layout={:.1}ms, write={:.1}ms, total={:.1}ms ({} lines, {} blocks, {} bytes)",
        t_background.as_secs_f64() * 1000.0,
        (t_render - t_background).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        lines,
        text_blocks,
        svg.len(),
    );

    Ok(Report {
        output: options.output_file.clone(),
        lines,
        text_blocks,
        background_asset,
        font_family,
    })
}
