use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Args, TargetFormat};
use crate::error::ConvertError;

/// Extensions picked up in directory mode (compared lower-cased)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff"];

/// Upper bound for `--jobs`
const MAX_JOBS: usize = 64;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate command line arguments
///
/// Runs before the output directory is created, so a missing source never
/// leaves an empty destination behind.
pub fn validate_inputs(args: &Args) -> Result<()> {
    if !args.source.exists() {
        return Err(ConvertError::MissingSource(args.source.clone()).into());
    }
    if !args.source.is_dir() && !args.source.is_file() {
        return Err(anyhow::anyhow!(
            "Source path is neither a file nor a directory: {}",
            args.source.display()
        ));
    }

    if let Some(jobs) = args.jobs {
        if jobs > MAX_JOBS {
            return Err(anyhow::anyhow!(
                "Job count too high (max {}), got: {}",
                MAX_JOBS,
                jobs
            ));
        }
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[&str]) -> bool {
    match get_file_extension(path) {
        Some(ext) => extensions.contains(&ext.as_str()),
        None => false,
    }
}

/// Source file name with its extension replaced by the target format's.
///
/// Only the last extension is swapped: `scan.v2.tiff` becomes `scan.v2.png`.
pub fn output_file_name(source: &Path, format: TargetFormat) -> PathBuf {
    let mut name: OsString = source
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| OsString::from("image"));
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Output path for single-file mode.
///
/// An existing directory receives `<stem>.<ext>`; anything else is used as
/// the output file path verbatim.
pub fn resolve_single_destination(
    source: &Path,
    destination: &Path,
    format: TargetFormat,
) -> PathBuf {
    if destination.is_dir() {
        destination.join(output_file_name(source, format))
    } else {
        destination.to_path_buf()
    }
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        eprintln!("{} {}", style("[VERBOSE]").dim().for_stderr(), message);
    }
}
