use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::Error;

/// Auto-oriented copy of an image. The temp file is removed when this drops.
pub(crate) struct NormalizedImage {
    file: NamedTempFile,
}

impl NormalizedImage {
    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }
}

/// `convert` (ImageMagick 6) or `magick` (ImageMagick 7), whichever answers `-version`.
fn find_imagemagick() -> Result<&'static str, Error> {
    for cmd in ["convert", "magick"] {
        let Ok(output) = Command::new(cmd).arg("-version").output() else {
            continue;
        };
        if output.status.success() {
            let banner = String::from_utf8_lossy(&output.stdout);
            let version: Vec<&str> = banner.split_whitespace().take(3).collect();
            log::info!("Using ImageMagick: {}", version.join(" "));
            return Ok(cmd);
        }
    }
    Err(Error::OrientationNormalizationUnavailable(
        "ImageMagick not found. Install ImageMagick to handle EXIF orientation".into(),
    ))
}

/// Keep timestamps out of the written file so reruns copy identical bytes.
const DETERMINISTIC_OUTPUT: &[&str] = &[
    "+set",
    "date:create",
    "+set",
    "date:modify",
    "+set",
    "date:timestamp",
    "-define",
    "png:exclude-chunk=date,time",
];

/// Apply the image's EXIF orientation with `-auto-orient`. Failure is for the
/// caller to downgrade; it never leaves a temp file behind.
pub(crate) fn normalize(source: &Path) -> Result<NormalizedImage, Error> {
    let cmd = find_imagemagick()?;

    let suffix = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix("textbox-svg-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| Error::OrientationNormalizationUnavailable(format!("temp file: {e}")))?;

    let output = Command::new(cmd)
        .arg(source)
        .arg("-auto-orient")
        .args(DETERMINISTIC_OUTPUT)
        .arg(file.path())
        .output()
        .map_err(|e| Error::OrientationNormalizationUnavailable(format!("{cmd}: {e}")))?;
    if !output.status.success() {
        return Err(Error::OrientationNormalizationUnavailable(format!(
            "{cmd} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    log::info!(
        "Normalized image orientation: {} -> {}",
        source.display(),
        file.path().display()
    );
    Ok(NormalizedImage { file })
}
