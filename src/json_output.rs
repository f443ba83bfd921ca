//! JSON lines output for scripting
//!
//! When `--json-progress` is given, every status update is written as one JSON
//! object per line on stdout and the human-readable output is suppressed.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::ConversionResult;

/// Last progress emission timestamp (milliseconds since epoch)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

/// Minimum gap between two progress lines
const PROGRESS_INTERVAL_MS: u64 = 40;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// File converted (or resolved, in a dry run)
    FileCompleted {
        input_path: String,
        output_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        color_mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bytes_written: Option<usize>,
        processing_time_ms: u64,
    },
    /// File conversion failed
    FileFailed { input_path: String, error: String },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Emit a progress message, throttled except for the final one
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= PROGRESS_INTERVAL_MS || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Build the completed/failed message for one file
    pub fn from_result(result: &ConversionResult) -> Self {
        match &result.outcome {
            Ok(converted) => Self::FileCompleted {
                input_path: result.source.display().to_string(),
                output_path: result.destination.display().to_string(),
                color_mode: converted.as_ref().map(|c| c.output_mode.to_string()),
                bytes_written: converted.as_ref().map(|c| c.bytes_written),
                processing_time_ms: result.duration.as_millis() as u64,
            },
            Err(e) => Self::FileFailed {
                input_path: result.source.display().to_string(),
                error: e.to_string(),
            },
        }
    }

    /// Create and emit summary message
    pub fn summary(total_files: usize, processed: usize, failed: usize, duration_secs: f64) {
        Self::Summary {
            total_files,
            processed,
            failed,
            duration_secs,
        }
        .emit();
    }
}
