use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum TargetFormat {
    /// JPEG, alpha flattened onto white
    #[value(name = "jpeg")]
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
    /// Lossy WebP
    #[value(name = "webp")]
    #[strum(to_string = "webp")]
    Webp,
    /// PNG, pixel data kept as decoded
    #[value(name = "png")]
    #[strum(to_string = "png")]
    Png,
    /// 8-bit palette PNG with an adaptive 256-color table
    #[value(name = "png8")]
    #[strum(to_string = "png8")]
    Png8,
}

impl TargetFormat {
    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Webp => "webp",
            TargetFormat::Png | TargetFormat::Png8 => "png",
        }
    }

    /// Whether `--compress` is applied as an encoder quality
    pub fn is_lossy(&self) -> bool {
        matches!(self, TargetFormat::Jpeg | TargetFormat::Webp)
    }

    pub fn description(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Webp => "WebP",
            TargetFormat::Png => "PNG",
            TargetFormat::Png8 => "PNG (8-bit palette)",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "imgconv",
    version,
    about = "Convert images between JPEG, WebP, PNG and palette PNG",
    long_about = "
Image conversion utility

Re-encodes a single image, or every image in a directory, into the requested
format. Directory mode picks up .png, .jpg, .jpeg, .webp, .bmp, .gif and .tiff
files and keeps going when an individual file fails.

Example Usage:
  # Single file
  imgconv photo.png photo.jpg --format jpeg --compress 85

  # Single file into an existing directory (keeps the file stem)
  imgconv photo.png ~/converted --format webp

  # Whole directory, four workers
  imgconv ~/Photos ~/converted --format png8 --jobs 4

  # Show what would be written without touching the disk
  imgconv ~/Photos ~/converted --format jpeg --dry-run"
)]
pub struct Args {
    /// Source image file or directory of images
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Destination file or directory
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Output format
    #[arg(long = "format", value_enum, required_unless_present = "config_file")]
    pub format: Option<TargetFormat>,

    /// Quality for jpeg/webp (10-100). Accepted but ignored for png and png8
    #[arg(
        long = "compress",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(10..=100)
    )]
    pub compress: Option<u8>,

    /// Number of parallel conversion jobs in directory mode (0 = one per CPU core)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Resolve inputs and output paths without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// JSON file with default settings (command-line arguments take precedence)
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Worker count for directory mode, `0` resolved to the CPU count
    pub fn parallel_jobs(&self) -> usize {
        match self.jobs {
            None => 1,
            Some(0) => num_cpus::get(),
            Some(n) => n,
        }
    }
}
