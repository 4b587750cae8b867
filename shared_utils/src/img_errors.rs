//! Shared Conversion Error Types
//!
//! Every per-file failure of a HEIC → JPEG round-trip is one of these.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode JPEG: {0}")]
    Encode(String),

    #[error("cannot create output folder '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found_names_path() {
        let err = ConvertError::InputNotFound(PathBuf::from("photos/a.heic"));
        assert!(err.to_string().contains("a.heic"));
    }

    #[test]
    fn test_output_dir_names_directory() {
        let err = ConvertError::OutputDir {
            path: PathBuf::from("/readonly/out"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/readonly/out"), "got: {}", msg);
    }

    #[test]
    fn test_io_error_converts() {
        let err: ConvertError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
