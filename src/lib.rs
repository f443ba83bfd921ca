// Library exports for reuse by the binary and integration tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use cli::{Args, TargetFormat};
pub use error::ConvertError;
pub use image_processing::convert::{convert, ColorMode, ConvertedImage};
pub use image_processing::{
    ConversionConfig, ConversionEngine, ConversionRequest, ConversionResult,
};
pub use json_output::JsonMessage;
