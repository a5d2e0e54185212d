use crate::fonts::FontHandle;
use crate::model::{Anchor, DrawCommand, PixelRect, TextBlock};
use crate::svg::escape_xml;

pub const TOP_MARGIN: i32 = 40;
pub const LEFT_MARGIN: i32 = 20;
pub const TEXT_PADDING: i32 = 5;
pub const LINE_SPACING: i32 = 27;

/// Positioned text blocks plus where the cursor ended up.
#[derive(Debug)]
pub struct LineLayout {
    pub commands: Vec<DrawCommand>,
    pub cursor: i32,
}

impl LineLayout {
    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(block) => Some(block),
            DrawCommand::Background(_) => None,
        })
    }
}

/// Drop one trailing `\n`, `\r\n` or `\r`, nothing else.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split file contents into lines, each still carrying its terminator.
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn split_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        let end = match bytes[i] {
            b'\n' => i,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i + 1,
            b'\r' => i,
            _ => {
                i += 1;
                continue;
            }
        };
        lines.push(&content[start..=end]);
        start = end + 1;
        i = start;
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Stack one highlighted block per non-blank line. Blank lines emit nothing
/// but still take a line slot.
pub fn layout<S: AsRef<str>>(lines: &[S], font: &FontHandle) -> LineLayout {
    let mut commands = Vec::new();
    let mut y = TOP_MARGIN;

    for line in lines {
        let text = strip_terminator(line.as_ref());
        if !text.trim().is_empty() {
            commands.push(DrawCommand::Text(place_line(text, y, font)));
        }
        y += LINE_SPACING;
    }

    LineLayout {
        commands,
        cursor: y,
    }
}

fn place_line(text: &str, y: i32, font: &FontHandle) -> TextBlock {
    let extent = font.measure(text);
    let rect = PixelRect {
        x: LEFT_MARGIN,
        y: y - TEXT_PADDING,
        width: extent.width + 2 * TEXT_PADDING as u32,
        height: extent.height + 2 * TEXT_PADDING as u32,
    };
    let anchor = Anchor {
        x: (rect.x + TEXT_PADDING) as f32,
        y: rect.y as f32 + rect.height as f32 / 2.0,
    };
    log::debug!("line at y={y}: {}x{} px", extent.width, extent.height);
    TextBlock {
        rect,
        text: escape_xml(text),
        anchor,
    }
}
