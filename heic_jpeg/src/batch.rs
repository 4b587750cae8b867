//! Folder conversion.

use crate::codec::ImageCodec;
use crate::config::{SOURCE_EXTENSION, TARGET_EXTENSION};
use crate::conversion::{convert, ConversionRequest};
use shared_utils::{collect_candidates, file_name_lossy, output_path_for, BatchTally};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quality: u8,
}

impl BatchRequest {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            quality,
        }
    }
}

/// Convert every `.heic` entry directly inside `input_dir`.
///
/// An existing output is never overwritten, whatever its content. The only
/// fatal condition is `input_dir` not being a directory, in which case
/// nothing else (including `output_dir`) is touched. A listing that cannot
/// be read is logged and counted as an error.
pub fn run_batch(
    request: &BatchRequest,
    codec: &dyn ImageCodec,
    log: &mut dyn FnMut(String),
) -> BatchTally {
    if !request.input_dir.is_dir() {
        tracing::error!(input_dir = ?request.input_dir, "Input folder does not exist");
        log(format!(
            "Error: input folder '{}' does not exist.",
            request.input_dir.display()
        ));
        return BatchTally::fatal();
    }

    log(format!(
        "Starting conversion of folder '{}' to '{}' (quality: {})...",
        request.input_dir.display(),
        request.output_dir.display(),
        request.quality
    ));

    let mut tally = BatchTally::new();
    let listing = collect_candidates(&request.input_dir, SOURCE_EXTENSION);

    for failure in listing.failures {
        log(format!(
            "Error: cannot read '{}': {}",
            failure.path.display(),
            failure.message
        ));
        tally.record_error();
    }

    for candidate in listing.candidates {
        let output_path = output_path_for(&candidate.path, &request.output_dir, TARGET_EXTENSION);

        if output_path.exists() {
            log(format!("Skipped (exists): {}", file_name_lossy(&output_path)));
            tally.record_skipped();
        } else if candidate.path.is_file() {
            let conversion = ConversionRequest::new(candidate.path, output_path, request.quality);
            let result = convert(&conversion, codec, log);
            log(result.message);
            if result.success {
                tally.record_converted();
            } else {
                tally.record_error();
            }
        } else {
            log(format!("Skipped (not a file): {}", candidate.name));
            tally.record_skipped();
        }
    }

    log("Folder conversion finished.".to_string());
    log(format!("Converted: {}", tally.converted));
    log(format!("Skipped: {}", tally.skipped));
    log(format!("Errors: {}", tally.errors));

    tracing::info!(
        input_dir = ?request.input_dir,
        output_dir = ?request.output_dir,
        converted = tally.converted,
        skipped = tally.skipped,
        errors = tally.errors,
        processed = tally.processed(),
        "Batch finished"
    );

    tally
}
