//! Error type shared by the conversion library.
//!
//! Request-level problems (missing source, bad compression value) are raised
//! before any file is opened. Per-file problems (decode, encode, write) are
//! carried inside a [`ConversionResult`](crate::ConversionResult) so a batch
//! can keep going.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::TargetFormat;

/// Smallest accepted `--compress` value.
pub const MIN_COMPRESSION: u8 = 10;
/// Largest accepted `--compress` value.
pub const MAX_COMPRESSION: u8 = 100;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source path does not exist
    #[error("Source file '{}' does not exist.", .0.display())]
    MissingSource(PathBuf),

    /// Compression value outside 10-100
    #[error("Invalid compression value {0}: expected an integer between 10 and 100")]
    InvalidCompression(u32),

    /// The source could not be read or decoded
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The target encoder rejected the pixel data
    #[error("{format} encoding failed: {message}")]
    Encode {
        format: TargetFormat,
        message: String,
    },

    /// The encoded bytes could not be written
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ConvertError {
    pub(crate) fn encode(format: TargetFormat, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }
}

/// Check a compression value against the accepted range.
pub fn validate_compression(value: Option<u32>) -> Result<Option<u8>, ConvertError> {
    match value {
        None => Ok(None),
        Some(v) if (MIN_COMPRESSION as u32..=MAX_COMPRESSION as u32).contains(&v) => {
            Ok(Some(v as u8))
        }
        Some(v) => Err(ConvertError::InvalidCompression(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_compression_bounds() {
        assert_eq!(validate_compression(None).unwrap(), None);
        assert_eq!(validate_compression(Some(10)).unwrap(), Some(10));
        assert_eq!(validate_compression(Some(100)).unwrap(), Some(100));

        assert!(matches!(
            validate_compression(Some(5)),
            Err(ConvertError::InvalidCompression(5))
        ));
        assert!(matches!(
            validate_compression(Some(150)),
            Err(ConvertError::InvalidCompression(150))
        ));
    }

    #[test]
    fn test_missing_source_message() {
        let err = ConvertError::MissingSource(PathBuf::from("nope.png"));
        assert_eq!(err.to_string(), "Source file 'nope.png' does not exist.");
    }
}
