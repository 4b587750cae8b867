//! HEIC to JPEG converter
//!
//! Converts single HEIC files or every `.heic` file directly inside a folder
//! into baseline RGB JPEGs at a chosen quality. Work runs on a background
//! thread; progress is reported as log lines to the desktop window.

pub mod batch;
pub mod codec;
pub mod config;
pub mod conversion;
pub mod gui;
pub mod runner;

pub use batch::{run_batch, BatchRequest};
pub use codec::{normalize_color, save_jpeg, HeifCodec, ImageCodec};
pub use conversion::{convert, run_single, ConversionRequest, ConversionResult};
pub use gui::ConverterApp;
pub use runner::{start_batch, start_single, JobCallbacks, JobEvent, JobHandle, RunnerError, Waker};
