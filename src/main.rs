use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use textbox_svg::{AssetDelivery, BackgroundOptions, DeliveryFlags, FontSelection, Options};

/// Generate an A4-sized SVG from a text file, one highlighted line per text
/// line, optionally over an image or a PDF page.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to input text file
    #[arg(long)]
    text_file: PathBuf,

    /// Path to background image or PDF
    #[arg(long)]
    background_file: Option<PathBuf>,

    /// Page number for PDF background (0-indexed)
    #[arg(long, default_value_t = 0)]
    page_number: usize,

    /// Output SVG filename
    #[arg(long, default_value = "output.svg")]
    output_file: PathBuf,

    /// Skip automatic image orientation normalization (EXIF auto-orient)
    #[arg(long)]
    no_normalize_orientation: bool,

    /// Reference background images as external files; without --copy-images
    /// the source is referenced in place by relative path
    #[arg(long, conflicts_with = "embed_images")]
    external_images: bool,

    /// Copy background images next to the SVG (default unless --external-images is given alone)
    #[arg(long, conflicts_with_all = ["embed_images", "no_copy_images"])]
    copy_images: bool,

    /// Reference the background image in place by relative path instead of copying it
    #[arg(long, conflicts_with = "embed_images")]
    no_copy_images: bool,

    /// Embed the background as base64 PNG instead of an external file
    #[arg(long)]
    embed_images: bool,

    /// Measure text with this font file instead of searching the system fonts
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// font-family written to the SVG (defaults to the resolved font's name)
    #[arg(long)]
    font_family: Option<String>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn delivery(&self) -> AssetDelivery {
        DeliveryFlags {
            embed_images: self.embed_images,
            external_images: self.external_images,
            copy_images: self.copy_images,
            no_copy_images: self.no_copy_images,
        }
        .delivery()
    }

    fn into_options(self) -> Options {
        let background = BackgroundOptions {
            delivery: self.delivery(),
            normalize_orientation: !self.no_normalize_orientation,
            page_number: self.page_number,
        };
        Options {
            text_file: self.text_file,
            background_file: self.background_file,
            output_file: self.output_file,
            background,
            font: self
                .font_file
                .map(FontSelection::File)
                .unwrap_or(FontSelection::Search),
            font_family: self.font_family,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = cli.into_options();
    match textbox_svg::generate(&options) {
        Ok(report) => {
            println!("SVG generated successfully: {}", report.output.display());
            if options.background_file.is_some() {
                match options.background.delivery {
                    AssetDelivery::Copy => {
                        println!("Note: SVG uses external image references with Inkscape compatibility features.");
                        println!("Images have been copied to the SVG directory for better portability.");
                    }
                    AssetDelivery::Reference => {
                        println!("Note: SVG uses external image references with Inkscape compatibility features.");
                        println!("Keep image files in the same relative location for proper display.");
                    }
                    AssetDelivery::Embed => {}
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
