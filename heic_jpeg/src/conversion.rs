//! Single-file HEIC → JPEG conversion.

use crate::codec::{normalize_color, save_jpeg, ImageCodec};
use shared_utils::{file_name_lossy, ConvertError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Meaningful in 1..=100; not validated here.
    pub quality: u8,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub success: bool,
    pub message: String,
}

impl ConversionResult {
    fn ok(request: &ConversionRequest) -> Self {
        Self {
            success: true,
            message: format!(
                "OK (quality {}): {} -> {}",
                request.quality,
                file_name_lossy(&request.input_path),
                file_name_lossy(&request.output_path)
            ),
        }
    }

    fn failed(request: &ConversionRequest, err: &ConvertError) -> Self {
        let message = match err {
            ConvertError::InputNotFound(path) => {
                format!("Error: input file not found: {}", path.display())
            }
            ConvertError::OutputDir { .. } => format!("Error: {}", err),
            _ => format!(
                "Conversion error {}: {}",
                file_name_lossy(&request.input_path),
                err
            ),
        };
        Self {
            success: false,
            message,
        }
    }
}

/// Convert one file. Never panics on I/O or codec failures; every failure
/// becomes `success == false` with a message naming the file or folder.
///
/// `log` receives intermediate lines (such as output folder creation); the
/// returned message is left to the caller to log.
pub fn convert(
    request: &ConversionRequest,
    codec: &dyn ImageCodec,
    log: &mut dyn FnMut(String),
) -> ConversionResult {
    match try_convert(request, codec, log) {
        Ok(()) => {
            tracing::info!(
                input = ?request.input_path,
                output = ?request.output_path,
                quality = request.quality,
                "Converted"
            );
            ConversionResult::ok(request)
        }
        Err(err) => {
            tracing::warn!(
                input = ?request.input_path,
                output = ?request.output_path,
                error = %err,
                "Conversion failed"
            );
            ConversionResult::failed(request, &err)
        }
    }
}

/// Single-file job: start line, the conversion, its message, a closing line.
pub fn run_single(
    request: &ConversionRequest,
    codec: &dyn ImageCodec,
    log: &mut dyn FnMut(String),
) -> bool {
    log(format!(
        "Starting conversion of file '{}' to '{}' (quality: {})...",
        file_name_lossy(&request.input_path),
        file_name_lossy(&request.output_path),
        request.quality
    ));

    let result = convert(request, codec, log);
    log(result.message);

    if result.success {
        log("File conversion finished successfully.".to_string());
    } else {
        log("File conversion failed.".to_string());
    }
    result.success
}

fn try_convert(
    request: &ConversionRequest,
    codec: &dyn ImageCodec,
    log: &mut dyn FnMut(String),
) -> shared_utils::Result<()> {
    ensure_output_dir(&request.output_path, log)?;

    if !request.input_path.exists() {
        return Err(ConvertError::InputNotFound(request.input_path.clone()));
    }

    let img = normalize_color(codec.open(&request.input_path)?);
    save_jpeg(&img, &request.output_path, request.quality)
}

/// Create the immediate parent of `output_path` when it is missing.
fn ensure_output_dir(output_path: &Path, log: &mut dyn FnMut(String)) -> shared_utils::Result<()> {
    let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if dir.exists() {
        return Ok(());
    }

    fs::create_dir(dir).map_err(|source| ConvertError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    log(format!("Created output folder: {}", dir.display()));
    Ok(())
}
