pub mod batch;
pub mod convert;
pub mod encode;
pub mod quantize;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::cli::TargetFormat;
use crate::error::{validate_compression, ConvertError};
use crate::utils::{
    has_valid_extension, output_file_name, resolve_single_destination, verbose_println,
    SUPPORTED_EXTENSIONS,
};
use batch::{process_files_parallel, BatchSummary};
use convert::{convert_image, ConvertedImage};

/// One invocation's worth of work, as given on the command line
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub format: TargetFormat,
    pub compression: Option<u32>,
}

impl ConversionRequest {
    /// Check everything that can be checked without touching the disk
    pub fn validate(&self) -> Result<ConversionConfig, ConvertError> {
        Ok(ConversionConfig {
            format: self.format,
            quality: validate_compression(self.compression)?,
            ..ConversionConfig::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub format: TargetFormat,
    /// Validated `--compress` value
    pub quality: Option<u8>,
    pub parallel_jobs: usize,
    pub verbose: bool,
    pub dry_run: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: TargetFormat::Png,
            quality: None,
            parallel_jobs: 1,
            verbose: false,
            dry_run: false,
        }
    }
}

/// Outcome for a single file
#[derive(Debug)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `Ok(None)` means a dry run resolved the paths but wrote nothing
    pub outcome: Result<Option<ConvertedImage>, ConvertError>,
    pub duration: Duration,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct ConversionEngine {
    config: ConversionConfig,
}

impl ConversionEngine {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// List convertible files directly inside `input_dir`, sorted by path
    pub fn discover_images(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        verbose_println(
            self.config.verbose,
            &format!("Scanning directory: {}", input_dir.display()),
        );

        let mut image_files = Vec::new();
        for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if entry.file_type().is_file() && has_valid_extension(path, SUPPORTED_EXTENSIONS) {
                image_files.push(path.to_path_buf());
            }
        }

        // Sort for consistent processing order
        image_files.sort();

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", image_files.len()),
        );
        Ok(image_files)
    }

    /// Convert (or, in dry-run mode, just resolve) one file
    pub fn convert_file(&self, source: &Path, destination: &Path) -> ConversionResult {
        let start = Instant::now();
        verbose_println(
            self.config.verbose,
            &format!("Processing: {}", source.display()),
        );

        let outcome = if self.config.dry_run {
            if source.exists() {
                Ok(None)
            } else {
                Err(ConvertError::MissingSource(source.to_path_buf()))
            }
        } else {
            convert_image(source, destination, self.config.format, self.config.quality).map(Some)
        };

        if let Ok(Some(converted)) = &outcome {
            verbose_println(
                self.config.verbose,
                &format!(
                    "{}: {} -> {}, {} bytes",
                    source.display(),
                    converted.source_mode,
                    converted.output_mode,
                    converted.bytes_written
                ),
            );
        }

        ConversionResult {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            outcome,
            duration: start.elapsed(),
        }
    }

    /// Single-file mode: resolve the output path and convert
    pub fn convert_single(&self, source: &Path, destination: &Path) -> ConversionResult {
        let output = resolve_single_destination(source, destination, self.config.format);
        self.convert_file(source, &output)
    }

    /// Directory mode: convert every supported file in `source_dir` into
    /// `dest_dir`.
    ///
    /// Per-file failures are returned in the result list, not as an `Err`;
    /// only problems with the directories themselves abort the run.
    /// `on_result` is called as each file finishes.
    pub fn convert_directory<P>(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        on_result: P,
    ) -> Result<(Vec<ConversionResult>, BatchSummary)>
    where
        P: Fn(&ConversionResult, usize, usize) + Send + Sync,
    {
        let start = Instant::now();
        let image_files = self.discover_images(source_dir)?;

        if !self.config.dry_run {
            fs::create_dir_all(dest_dir).with_context(|| {
                format!("Failed to create output directory {}", dest_dir.display())
            })?;
        }

        let total = image_files.len();
        let results = process_files_parallel(
            &image_files,
            self.config.parallel_jobs,
            |source| {
                let destination = dest_dir.join(output_file_name(source, self.config.format));
                self.convert_file(source, &destination)
            },
            |result, completed| on_result(result, completed, total),
        )?;

        let successful = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total_files: total,
            successful,
            failed: total - successful,
            total_duration: start.elapsed(),
        };
        Ok((results, summary))
    }
}
