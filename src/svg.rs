use std::fmt::Write;

use base64::Engine;

use crate::model::{BackgroundImage, BackgroundReference, DrawCommand, Page, Style, TextBlock};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Characters XML 1.0 does not allow anywhere in a document.
fn is_xml_forbidden(ch: char) -> bool {
    matches!(ch,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Escape markup characters; forbidden control characters become U+FFFD.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_forbidden(c) => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

/// Serialize the page: declaration, root, optional background, then text
/// blocks in the order given. Commands are never reordered.
pub fn assemble(
    page: &Page,
    background: Option<&BackgroundImage>,
    commands: &[DrawCommand],
    style: &Style,
) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<svg width=\"{}mm\" height=\"{}mm\" viewBox=\"0 0 {} {}\" xmlns=\"{SVG_NS}\" xmlns:xlink=\"{XLINK_NS}\">",
        page.width_mm, page.height_mm, page.width_px, page.height_px,
    );

    if let Some(bg) = background {
        write_background(&mut out, bg);
    }
    for command in commands {
        match command {
            DrawCommand::Background(bg) => write_background(&mut out, bg),
            DrawCommand::Text(block) => write_text_block(&mut out, block, style),
        }
    }

    out.push_str("</svg>\n");
    out
}

fn href(reference: &BackgroundReference) -> String {
    match reference {
        BackgroundReference::Path(path) => escape_xml(path),
        BackgroundReference::InlineBytes(bytes) => format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ),
    }
}

// Inkscape resolves only xlink:href, browsers prefer href; both carry the same value.
fn write_background(out: &mut String, bg: &BackgroundImage) {
    let href = href(&bg.reference);
    let _ = writeln!(
        out,
        "  <image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" href=\"{href}\" xlink:href=\"{href}\" preserveAspectRatio=\"xMidYMid meet\"/>",
        bg.width, bg.height,
    );
}

fn write_text_block(out: &mut String, block: &TextBlock, style: &Style) {
    let r = &block.rect;
    out.push_str("  <g>\n");
    let _ = writeln!(
        out,
        "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"none\" opacity=\"{}\"/>",
        r.x, r.y, r.width, r.height, style.rect_fill, style.rect_opacity,
    );
    let _ = writeln!(
        out,
        "    <text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" dominant-baseline=\"central\" text-anchor=\"start\">{}</text>",
        block.anchor.x,
        block.anchor.y,
        escape_xml(&style.font_family),
        style.font_size,
        style.text_fill,
        block.text,
    );
    out.push_str("  </g>\n");
}
