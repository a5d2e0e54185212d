use std::collections::HashMap;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use ttf_parser::{Face, GlyphId};

use crate::error::Error;

/// Font size used for both measurement and the `font-size` attribute.
pub const FONT_SIZE: u32 = 16;

/// Family written to the output when the built-in metrics are in use.
pub const GENERIC_FAMILY: &str = "sans-serif";

/// (file name, declared SVG family) in order of preference.
pub const FONT_CANDIDATES: &[(&str, &str)] = &[
    ("NotoSansCJK-Regular.ttc", "Noto Sans CJK JP Regular"),
    ("Hiragino Sans GB.ttc", "Hiragino Sans"),
    ("NotoSans-Regular.ttf", "Noto Sans"),
    ("DejaVuSans.ttf", "DejaVu Sans"),
    ("LiberationSans-Regular.ttf", "Liberation Sans"),
];

/// Tight ink extent of a text run, in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

enum FontSource {
    Mapped { data: Mmap, face_index: u32 },
    Builtin,
}

/// Metrics font for one run. The declared `family` is what the output names;
/// it is fixed per candidate and may not describe the measured face.
pub struct FontHandle {
    source: FontSource,
    family: String,
    path: Option<PathBuf>,
}

impl FontHandle {
    pub fn builtin() -> Self {
        FontHandle {
            source: FontSource::Builtin,
            family: GENERIC_FAMILY.to_string(),
            path: None,
        }
    }

    /// Load face 0 of `path`, naming it after the face's family (or the file stem).
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = map_font(path)
            .map_err(|e| Error::FontUnavailable(format!("{}: {e}", path.display())))?;
        let family = {
            let face = Face::parse(&data, 0).map_err(|e| {
                Error::FontUnavailable(format!("{}: {e}", path.display()))
            })?;
            font_family_name(&face)
        }
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_FAMILY.to_string());
        Ok(FontHandle {
            source: FontSource::Mapped {
                data,
                face_index: 0,
            },
            family,
            path: Some(path.to_path_buf()),
        })
    }

    fn from_candidate(path: &Path, family: &str) -> Option<Self> {
        let data = map_font(path).ok()?;
        Face::parse(&data, 0).ok()?;
        Some(FontHandle {
            source: FontSource::Mapped {
                data,
                face_index: 0,
            },
            family: family.to_string(),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FontSource::Builtin)
    }

    /// Bounding box of `text` rendered at [`FONT_SIZE`].
    pub fn measure(&self, text: &str) -> TextExtent {
        match &self.source {
            FontSource::Mapped { data, face_index } => match Face::parse(data, *face_index) {
                Ok(face) => measure_face(&face, text),
                // Validated at load time; only reachable if the file changed under the map.
                Err(_) => measure_builtin(text),
            },
            FontSource::Builtin => measure_builtin(text),
        }
    }
}

fn map_font(path: &Path) -> std::io::Result<Mmap> {
    let file = std::fs::File::open(path)?;
    unsafe { Mmap::map(&file) }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn measure_face(face: &Face, text: &str) -> TextExtent {
    let scale = FONT_SIZE as f32 / face.units_per_em() as f32;
    let mut pen = 0.0f32;
    let mut ink: Option<(f32, f32, f32, f32)> = None;

    for ch in text.chars() {
        let gid = face.glyph_index(ch).unwrap_or(GlyphId(0));
        if let Some(bb) = face.glyph_bounding_box(gid) {
            let glyph = (
                pen + bb.x_min as f32,
                bb.y_min as f32,
                pen + bb.x_max as f32,
                bb.y_max as f32,
            );
            ink = Some(match ink {
                Some((x0, y0, x1, y1)) => (
                    x0.min(glyph.0),
                    y0.min(glyph.1),
                    x1.max(glyph.2),
                    y1.max(glyph.3),
                ),
                None => glyph,
            });
        }
        pen += face.glyph_hor_advance(gid).unwrap_or(0) as f32;
    }

    match ink {
        Some((x0, y0, x1, y1)) => TextExtent {
            width: ((x1 * scale).ceil() - (x0 * scale).floor()).max(0.0) as u32,
            height: ((y1 * scale).ceil() - (y0 * scale).floor()).max(0.0) as u32,
        },
        None => {
            let line = face.ascender() as f32 - face.descender() as f32;
            TextExtent {
                width: (pen * scale).ceil() as u32,
                height: (line * scale).ceil() as u32,
            }
        }
    }
}

/// Ascender plus descender of the built-in metrics, in em.
const BUILTIN_EXTENT_EM: f32 = 0.925;

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

/// Approximate Helvetica advance at 1000 units/em; wide East Asian chars take a full em.
fn builtin_advance_1000(ch: char) -> f32 {
    if is_wide(ch) {
        return 1000.0;
    }
    match ch {
        ' ' => 278.0,
        '0'..='9' => 556.0,
        'I' | 'J' => 278.0,
        'M' => 833.0,
        'A'..='Z' => 667.0,
        'f' | 'i' | 'j' | 'l' | 't' => 278.0,
        'm' | 'w' => 833.0,
        'a'..='z' => 556.0,
        '!'..='/' | ':'..='@' | '['..='`' | '{'..='~' => 333.0,
        _ => 556.0,
    }
}

fn measure_builtin(text: &str) -> TextExtent {
    let advance: f32 = text.chars().map(builtin_advance_1000).sum();
    TextExtent {
        width: (advance * FONT_SIZE as f32 / 1000.0).ceil() as u32,
        height: (BUILTIN_EXTENT_EM * FONT_SIZE as f32).ceil() as u32,
    }
}

/// Directories searched for candidate fonts, most specific first.
pub fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("TEXTBOX_SVG_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
            "/Library/Fonts".into(),
            "/opt/homebrew/share/fonts".into(),
            "/usr/local/share/fonts".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

/// Lowercase file name -> paths, in traversal order.
type FileIndex = HashMap<String, Vec<PathBuf>>;

/// Walks `dirs` depth-first with sorted listings so the first hit is stable
/// between runs. Symlinked directories are followed, but each real directory
/// is listed once, so link cycles terminate.
fn index_font_files(dirs: &[PathBuf]) -> FileIndex {
    let mut index = FileIndex::new();
    let mut visited: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();
    let mut stack: Vec<PathBuf> = dirs.iter().rev().cloned().collect();

    while let Some(dir) = stack.pop() {
        let Ok(real) = dir.canonicalize() else {
            continue;
        };
        if !visited.insert(real) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        let mut subdirs = Vec::new();
        for path in paths {
            if path.is_dir() {
                subdirs.push(path);
            } else if is_font_file(&path)
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                index.entry(name.to_lowercase()).or_default().push(path);
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }

    index
}

/// One-shot font lookup over a fixed set of directories.
pub struct FontResolver {
    dirs: Vec<PathBuf>,
}

impl Default for FontResolver {
    fn default() -> Self {
        FontResolver::new()
    }
}

impl FontResolver {
    pub fn new() -> Self {
        FontResolver {
            dirs: font_directories(),
        }
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        FontResolver { dirs }
    }

    /// First loadable candidate wins; the built-in metrics are the last resort.
    pub fn resolve(&self) -> FontHandle {
        let t0 = std::time::Instant::now();
        let index = index_font_files(&self.dirs);
        log::debug!(
            "Font scan: {:.1}ms over {} dirs, {} font file names",
            t0.elapsed().as_secs_f64() * 1000.0,
            self.dirs.len(),
            index.len(),
        );

        let (primary_file, primary_family) = FONT_CANDIDATES[0];
        for (position, &(file_name, family)) in FONT_CANDIDATES.iter().enumerate() {
            let Some(paths) = index.get(&file_name.to_lowercase()) else {
                continue;
            };
            for path in paths {
                let Some(handle) = FontHandle::from_candidate(path, family) else {
                    log::debug!("Skipping unreadable font {}", path.display());
                    continue;
                };
                if position == 0 {
                    log::info!("Using primary font: {family} ({})", path.display());
                } else {
                    log::warn!("Primary font '{primary_family}' ({primary_file}) not found");
                    log::warn!("Using fallback font: {family} ({})", path.display());
                    log::warn!(
                        "For best Japanese text rendering install Noto Sans CJK \
                         (Ubuntu/Debian: apt install fonts-noto-cjk, macOS: brew install font-noto-sans-cjk)"
                    );
                }
                return handle;
            }
        }

        log::warn!("Primary font '{primary_family}' not found");
        log::warn!("No suitable fallback fonts found, using built-in metrics");
        log::warn!("Japanese characters may not display correctly");
        FontHandle::builtin()
    }
}
