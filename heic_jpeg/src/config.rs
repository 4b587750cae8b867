//! Converter defaults. Nothing here is persisted between runs.

use shared_utils::logging::LogConfig;
use std::ops::RangeInclusive;

/// Candidate files end with this, compared case-insensitively.
pub const SOURCE_EXTENSION: &str = ".heic";
pub const TARGET_EXTENSION: &str = ".jpg";

pub const DEFAULT_QUALITY: u8 = 95;
pub const QUALITY_RANGE: RangeInclusive<u8> = 1..=100;

pub const PROGRAM_NAME: &str = "heic_jpeg";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_size: [f32; 2],
    pub default_quality: u8,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "HEIC to JPG Converter".to_string(),
            window_size: [600.0, 530.0],
            default_quality: DEFAULT_QUALITY,
            log: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quality_in_range() {
        assert!(QUALITY_RANGE.contains(&DEFAULT_QUALITY));
        assert_eq!(AppConfig::default().default_quality, 95);
    }

    #[test]
    fn test_extensions_have_leading_dot() {
        assert!(SOURCE_EXTENSION.starts_with('.'));
        assert!(TARGET_EXTENSION.starts_with('.'));
    }
}
