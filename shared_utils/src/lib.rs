//! Shared Utilities for the HEIC to JPEG converter
//!
//! - HEIC decoding through libheif (one-time process-wide registration)
//! - Directory listing and tally for batch runs
//! - File-name matching helpers
//! - tracing-based logging setup
//! - Conversion error types

pub mod batch;
pub mod common_utils;
pub mod image_heic_decode;
pub mod img_errors;
pub mod logging;

pub use batch::{collect_candidates, BatchTally, Candidate, Listing, ListingFailure};
pub use common_utils::{file_name_lossy, file_stem_lossy, has_suffix_ignore_case, output_path_for};
pub use image_heic_decode::{decode_heic_file, register_heif_decoder, HeicInfo};
pub use img_errors::{ConvertError, Result};
