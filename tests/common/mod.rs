use std::fs;
use std::path::{Path, PathBuf};

use textbox_svg::{Error, FontSelection, Options};

pub fn scratch() -> tempfile::TempDir {
    tempfile::tempdir().expect("create scratch dir")
}

pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write text fixture");
    path
}

/// Solid-color RGB image, encoded by extension.
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 180, 40]));
    img.save(&path).expect("write image fixture");
    path
}

/// Smallest well-formed PDF with `pages` empty US Letter pages.
pub fn minimal_pdf(pages: usize) -> Vec<u8> {
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {pages} >>", kids.join(" ")),
    ];
    for _ in 0..pages {
        objects.push(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> >>".to_string(),
        );
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{obj}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, minimal_pdf(pages)).expect("write pdf fixture");
    path
}

/// True when the failure only means pdfium is not installed on this machine.
pub fn pdfium_missing(err: &Error) -> bool {
    matches!(err, Error::PdfRender(msg) if msg.contains("pdfium library"))
}

/// True when `convert` or `magick` answers `-version`.
pub fn imagemagick_available() -> bool {
    ["convert", "magick"].iter().any(|cmd| {
        std::process::Command::new(cmd)
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success())
    })
}

/// Options with deterministic built-in metrics and no ImageMagick dependency.
pub fn options(text_file: &Path, output_file: &Path) -> Options {
    let mut opts = Options::new(text_file);
    opts.output_file = output_file.to_path_buf();
    opts.font = FontSelection::Builtin;
    opts.background.normalize_orientation = false;
    opts
}

pub struct Group {
    pub rect_y: String,
    pub rect_height: String,
    pub text_y: String,
    pub text: String,
}

/// Parse the SVG (panics if it is not well-formed XML) and collect the text groups.
pub fn text_groups(svg: &str) -> Vec<Group> {
    let doc = roxmltree::Document::parse(svg).expect("well-formed svg");
    doc.descendants()
        .filter(|n| n.has_tag_name("g"))
        .map(|g| {
            let rect = g.children().find(|n| n.has_tag_name("rect")).expect("rect in group");
            let text = g.children().find(|n| n.has_tag_name("text")).expect("text in group");
            Group {
                rect_y: rect.attribute("y").unwrap_or_default().to_string(),
                rect_height: rect.attribute("height").unwrap_or_default().to_string(),
                text_y: text.attribute("y").unwrap_or_default().to_string(),
                text: text.text().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

/// (`href`, `xlink:href`) of the background `<image>`, if present.
pub fn background_hrefs(svg: &str) -> Option<(String, String)> {
    let doc = roxmltree::Document::parse(svg).expect("well-formed svg");
    let image = doc.descendants().find(|n| n.has_tag_name("image"))?;
    Some((
        image.attribute("href")?.to_string(),
        image
            .attribute(("http://www.w3.org/1999/xlink", "href"))?
            .to_string(),
    ))
}

/// First file named `file_name` under the usual Linux font roots, for tests
/// that need a real outline font.
pub fn find_system_font(file_name: &str) -> Option<PathBuf> {
    let mut stack: Vec<PathBuf> = vec!["/usr/share/fonts".into(), "/usr/local/share/fonts".into()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(file_name))
            {
                return Some(path);
            }
        }
    }
    None
}
