/// Millimetre to pixel factor at 96 DPI.
pub const MM_TO_PX: f64 = 3.779527559;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Page {
    pub width_mm: u32,
    pub height_mm: u32,
    pub width_px: u32,
    pub height_px: u32,
}

impl Page {
    /// ISO A4, viewbox truncated to whole pixels (793 x 1122).
    pub fn a4() -> Self {
        Self::from_mm(210, 297)
    }

    fn from_mm(width_mm: u32, height_mm: u32) -> Self {
        Page {
            width_mm,
            height_mm,
            width_px: (width_mm as f64 * MM_TO_PX) as u32,
            height_px: (height_mm as f64 * MM_TO_PX) as u32,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::a4()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32, // center line, not baseline
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub rect: PixelRect,
    /// Line content, already escaped for XML.
    pub text: String,
    pub anchor: Anchor,
}

/// How the output document reaches its background raster.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundReference {
    /// File name or relative path, written as-is into `href`.
    Path(String),
    /// PNG bytes, embedded as a base64 data URI.
    InlineBytes(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundImage {
    pub reference: BackgroundReference,
    pub width: u32,
    pub height: u32,
}

impl BackgroundImage {
    /// Placement covering the whole page.
    pub fn full_page(reference: BackgroundReference, page: &Page) -> Self {
        BackgroundImage {
            reference,
            width: page.width_px,
            height: page.height_px,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Background(BackgroundImage),
    Text(TextBlock),
}

/// Visual constants of the overlay.
#[derive(Clone, Debug)]
pub struct Style {
    pub font_family: String,
    pub font_size: u32,
    pub rect_fill: &'static str,
    pub rect_opacity: f32,
    pub text_fill: &'static str,
}

impl Style {
    pub fn new(font_family: impl Into<String>) -> Self {
        Style {
            font_family: font_family.into(),
            font_size: crate::fonts::FONT_SIZE,
            rect_fill: "#FFFFFF",
            rect_opacity: 0.9,
            text_fill: "#000000",
        }
    }
}
