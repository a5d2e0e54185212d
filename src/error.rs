use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// A required input (text file or background source) does not exist.
    InputNotFound { what: &'static str, path: PathBuf },
    UnsupportedBackgroundFormat(String),
    PageOutOfRange { page: usize, page_count: usize },
    FontUnavailable(String),
    /// Never fatal: the caller falls back to the unmodified image.
    OrientationNormalizationUnavailable(String),
    AssetCopyFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    InvalidText {
        path: PathBuf,
        source: std::io::Error,
    },
    PdfRender(String),
    Image(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputNotFound { what, path } => {
                write!(f, "{what} not found: {}", path.display())
            }
            Error::UnsupportedBackgroundFormat(ext) => {
                write!(f, "Unsupported background file type: {ext}")
            }
            Error::PageOutOfRange { page, page_count } => write!(
                f,
                "Page {page} does not exist in PDF (has {page_count} pages)"
            ),
            Error::FontUnavailable(msg) => write!(f, "Could not load any font: {msg}"),
            Error::OrientationNormalizationUnavailable(msg) => {
                write!(f, "Could not normalize orientation: {msg}")
            }
            Error::AssetCopyFailure { from, to, source } => write!(
                f,
                "Failed to copy {} to {}: {source}",
                from.display(),
                to.display()
            ),
            Error::InvalidText { path, source } => {
                write!(f, "Cannot read text file {}: {source}", path.display())
            }
            Error::PdfRender(msg) => write!(f, "Error processing PDF: {msg}"),
            Error::Image(msg) => write!(f, "Error processing image: {msg}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AssetCopyFailure { source, .. } | Error::InvalidText { source, .. } => {
                Some(source)
            }
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
