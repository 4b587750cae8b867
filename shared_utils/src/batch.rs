//! Batch Processing Module
//!
//! Directory listing for batch runs and the running tally of a batch.

use crate::common_utils::has_suffix_ignore_case;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A directory entry whose name carries the source extension.
///
/// It may still be a directory or a dangling link; callers decide. `name` is
/// lossy and meant for display; `path` keeps the exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
}

/// An entry (or the directory itself) that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of listing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<ListingFailure>,
}

/// Immediate entries of `dir` whose names end with `suffix` (case-insensitive).
///
/// Order is whatever the platform's directory enumeration yields. Read errors,
/// including failing to open `dir` itself, are returned in `failures`.
pub fn collect_candidates(dir: &Path, suffix: &str) -> Listing {
    let mut listing = Listing::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                tracing::warn!(path = ?path, error = %err, "Failed to read directory entry");
                listing.failures.push(ListingFailure {
                    path,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if has_suffix_ignore_case(&name, suffix) {
            listing.candidates.push(Candidate {
                name,
                path: entry.into_path(),
            });
        }
    }

    listing
}

/// Counters of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub converted: usize,
    pub skipped: usize,
    pub errors: usize,
    /// The input directory was invalid; nothing was processed.
    pub fatal: bool,
}

impl BatchTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fatal() -> Self {
        Self {
            fatal: true,
            ..Self::default()
        }
    }

    pub fn record_converted(&mut self) {
        self.converted += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Number of candidates classified so far.
    pub fn processed(&self) -> usize {
        self.converted + self.skipped + self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
