//! Desktop window: folder and single-file conversion, live log, status line.
//!
//! All state lives on the GUI thread. Jobs run through [`crate::runner`] and
//! their events are drained at the start of every frame.

use crate::batch::BatchRequest;
use crate::codec::ImageCodec;
use crate::config::{AppConfig, QUALITY_RANGE, TARGET_EXTENSION};
use crate::conversion::ConversionRequest;
use crate::runner::{start_batch, start_single, JobCallbacks, JobHandle, Waker};
use eframe::egui;
use shared_utils::{file_name_lossy, output_path_for, BatchTally};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Progress,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn color(self) -> egui::Color32 {
        match self {
            Tone::Info => egui::Color32::LIGHT_BLUE,
            Tone::Progress | Tone::Warning => egui::Color32::ORANGE,
            Tone::Success => egui::Color32::GREEN,
            Tone::Error => egui::Color32::RED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Modal message shown over the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(tone: Tone, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Both folders must be set and the input folder must exist.
pub fn validate_batch(input_dir: &str, output_dir: &str, quality: u8) -> Result<BatchRequest, Notice> {
    let input_dir = input_dir.trim();
    let output_dir = output_dir.trim();

    if input_dir.is_empty() || output_dir.is_empty() {
        return Err(Notice::new(
            Tone::Warning,
            "Missing folders",
            "Please choose both the input and the output folder for folder conversion.",
        ));
    }
    if !Path::new(input_dir).is_dir() {
        return Err(Notice::new(
            Tone::Error,
            "Error",
            format!("Input folder does not exist:\n{}", input_dir),
        ));
    }
    Ok(BatchRequest::new(input_dir, output_dir, quality))
}

pub fn require_output_dir(output_dir: &str) -> Result<PathBuf, Notice> {
    let output_dir = output_dir.trim();
    if output_dir.is_empty() {
        return Err(Notice::new(
            Tone::Warning,
            "Missing output folder",
            "Please choose the 'Output folder (JPG)' in the folder conversion section first.",
        ));
    }
    Ok(PathBuf::from(output_dir))
}

/// `output_dir / (stem + ".jpg")` for a picked source file.
pub fn single_target(input_path: &Path, output_dir: &Path) -> PathBuf {
    output_path_for(input_path, output_dir, TARGET_EXTENSION)
}

pub fn batch_outcome(tally: &BatchTally) -> (StatusLine, Notice) {
    if tally.fatal {
        (
            StatusLine::new("Folder conversion ended with a critical error.", Tone::Error),
            Notice::new(
                Tone::Error,
                "Error",
                "A critical error occurred during folder conversion. Check the log.",
            ),
        )
    } else if tally.has_errors() {
        (
            StatusLine::new(
                format!(
                    "Folder conversion finished (OK: {}, Skipped: {}, Errors: {}).",
                    tally.converted, tally.skipped, tally.errors
                ),
                Tone::Warning,
            ),
            Notice::new(
                Tone::Warning,
                "Finished with problems",
                format!(
                    "Folder conversion finished.\nConverted: {}\nSkipped: {}\nErrors: {}",
                    tally.converted, tally.skipped, tally.errors
                ),
            ),
        )
    } else {
        (
            StatusLine::new(
                format!(
                    "Folder conversion finished successfully (OK: {}, Skipped: {}).",
                    tally.converted, tally.skipped
                ),
                Tone::Success,
            ),
            Notice::new(
                Tone::Success,
                "Finished",
                format!(
                    "Folder conversion finished successfully!\nConverted: {}\nSkipped: {}",
                    tally.converted, tally.skipped
                ),
            ),
        )
    }
}

pub fn single_outcome(success: bool) -> (StatusLine, Notice) {
    if success {
        (
            StatusLine::new("File conversion finished successfully.", Tone::Success),
            Notice::new(Tone::Success, "Finished", "The file was converted successfully."),
        )
    } else {
        (
            StatusLine::new("File conversion failed.", Tone::Error),
            Notice::new(
                Tone::Error,
                "Error",
                "The file could not be converted. Check the log.",
            ),
        )
    }
}

pub struct ConverterApp {
    config: AppConfig,
    codec: Arc<dyn ImageCodec>,
    input_dir: String,
    output_dir: String,
    quality: u8,
    status: StatusLine,
    log_lines: Vec<String>,
    job: Option<JobHandle>,
    notice: Option<Notice>,
    /// Waiting for the user to confirm overwriting its output.
    pending_overwrite: Option<ConversionRequest>,
}

impl ConverterApp {
    pub fn new(config: AppConfig, codec: Arc<dyn ImageCodec>) -> Self {
        let quality = config.default_quality;
        Self {
            config,
            codec,
            input_dir: String::new(),
            output_dir: String::new(),
            quality,
            status: StatusLine::new("Choose a conversion option", Tone::Info),
            log_lines: Vec::new(),
            job: None,
            notice: None,
            pending_overwrite: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    fn waker(ctx: &egui::Context) -> Waker {
        let ctx = ctx.clone();
        Arc::new(move || ctx.request_repaint())
    }

    fn drain_job(&mut self) {
        if let Some(mut job) = self.job.take() {
            if !job.dispatch(self) {
                self.job = Some(job);
            }
        }
    }

    fn start_batch_conversion(&mut self, ctx: &egui::Context) {
        let request = match validate_batch(&self.input_dir, &self.output_dir, self.quality) {
            Ok(request) => request,
            Err(notice) => {
                self.notice = Some(notice);
                return;
            }
        };

        self.log_lines.clear();
        self.status = StatusLine::new(
            format!("Folder conversion in progress (quality: {})...", self.quality),
            Tone::Progress,
        );
        tracing::info!(input_dir = ?request.input_dir, output_dir = ?request.output_dir, "Starting folder job");

        match start_batch(request, Arc::clone(&self.codec), Self::waker(ctx)) {
            Ok(job) => self.job = Some(job),
            Err(e) => self.spawn_failed(&e.to_string()),
        }
    }

    fn choose_single_file(&mut self, ctx: &egui::Context) {
        let output_dir = match require_output_dir(&self.output_dir) {
            Ok(dir) => dir,
            Err(notice) => {
                self.notice = Some(notice);
                return;
            }
        };

        let Some(input_path) = rfd::FileDialog::new()
            .set_title("Choose a HEIC file to convert")
            .add_filter("HEIC files", &["heic", "HEIC"])
            .add_filter("All files", &["*"])
            .pick_file()
        else {
            return;
        };

        let output_path = single_target(&input_path, &output_dir);
        let request = ConversionRequest::new(input_path, output_path, self.quality);

        if request.output_path.exists() {
            self.pending_overwrite = Some(request);
        } else {
            self.start_single_conversion(request, ctx);
        }
    }

    fn start_single_conversion(&mut self, request: ConversionRequest, ctx: &egui::Context) {
        self.log_lines.clear();
        self.status = StatusLine::new(
            format!("File conversion in progress (quality: {})...", request.quality),
            Tone::Progress,
        );
        tracing::info!(input = ?request.input_path, output = ?request.output_path, "Starting single-file job");

        match start_single(request, Arc::clone(&self.codec), Self::waker(ctx)) {
            Ok(job) => self.job = Some(job),
            Err(e) => self.spawn_failed(&e.to_string()),
        }
    }

    fn spawn_failed(&mut self, reason: &str) {
        tracing::error!(error = reason, "Could not start conversion");
        self.log_lines.push(format!("Error: {}", reason));
        self.status = StatusLine::new("Could not start the conversion.", Tone::Error);
        self.notice = Some(Notice::new(Tone::Error, "Error", reason));
    }

    fn folder_section(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, idle: bool) {
        ui.group(|ui| {
            ui.strong("Folder conversion");
            egui::Grid::new("folders").num_columns(3).spacing([8.0, 6.0]).show(ui, |ui| {
                ui.label("HEIC folder:");
                ui.add(egui::TextEdit::singleline(&mut self.input_dir).desired_width(340.0));
                if ui.button("Browse...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_title("Choose the folder with HEIC files")
                        .pick_folder()
                    {
                        self.input_dir = dir.display().to_string();
                        self.status = StatusLine::new("Ready to convert the folder.", Tone::Info);
                    }
                }
                ui.end_row();

                ui.label("Output folder (JPG):");
                ui.add(egui::TextEdit::singleline(&mut self.output_dir).desired_width(340.0));
                if ui.button("Browse...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_title("Choose the output folder for JPG files")
                        .pick_folder()
                    {
                        self.output_dir = dir.display().to_string();
                        self.status = StatusLine::new("Output folder chosen. Ready to convert.", Tone::Info);
                    }
                }
                ui.end_row();
            });

            ui.add_space(4.0);
            if ui
                .add_enabled(idle, egui::Button::new(egui::RichText::new("Convert whole folder").strong()))
                .clicked()
            {
                self.start_batch_conversion(ctx);
            }
        });
    }

    fn quality_section(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("JPG quality (1-100):");
            ui.add(egui::Slider::new(&mut self.quality, QUALITY_RANGE));
        });
    }

    fn single_section(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, idle: bool) {
        ui.group(|ui| {
            ui.strong("Single file conversion");
            let button = egui::Button::new(
                egui::RichText::new("Choose HEIC file and convert (to output folder)").strong(),
            );
            if ui.add_enabled(idle, button).clicked() {
                self.choose_single_file(ctx);
            }
        });
    }

    fn log_section(&self, ui: &mut egui::Ui) {
        ui.colored_label(self.status.tone.color(), &self.status.text);
        ui.label("Conversion log:");
        egui::Frame::group(ui.style()).show(ui, |ui| {
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    for line in &self.log_lines {
                        ui.label(egui::RichText::new(line).monospace());
                    }
                });
        });
    }

    fn show_overwrite_prompt(&mut self, ctx: &egui::Context) {
        let Some(request) = &self.pending_overwrite else {
            return;
        };
        let name = file_name_lossy(&request.output_path);

        let mut answer = None;
        egui::Window::new("File exists")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "The file '{}' already exists in the output folder.\nDo you want to overwrite it?",
                    name
                ));
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(false);
                    }
                });
            });

        match answer {
            Some(true) => {
                if let Some(request) = self.pending_overwrite.take() {
                    self.start_single_conversion(request, ctx);
                }
            }
            Some(false) => {
                self.pending_overwrite = None;
                self.append_log(format!("Skipped (overwrite declined): {}", name));
            }
            None => {}
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };

        let mut close = false;
        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(notice.tone.color(), &notice.body);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });

        if close {
            self.notice = None;
        }
    }
}

impl JobCallbacks for ConverterApp {
    fn append_log(&mut self, line: String) {
        self.log_lines.push(line);
    }

    fn on_batch_done(&mut self, tally: BatchTally) {
        let (status, notice) = batch_outcome(&tally);
        self.status = status;
        self.notice = Some(notice);
    }

    fn on_single_done(&mut self, success: bool) {
        let (status, notice) = single_outcome(success);
        self.status = status;
        self.notice = Some(notice);
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_job();

        let modal_open = self.notice.is_some() || self.pending_overwrite.is_some();
        let idle = !self.is_busy() && !modal_open;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.config.window_title.as_str());
            ui.add_space(6.0);
            self.folder_section(ui, ctx, idle);
            ui.add_space(6.0);
            self.quality_section(ui);
            ui.add_space(6.0);
            self.single_section(ui, ctx, idle);
            ui.add_space(6.0);
            self.log_section(ui);
        });

        self.show_overwrite_prompt(ctx);
        self.show_notice(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_png_fixture, PngFixtureCodec};
    use tempfile::TempDir;

    fn app() -> ConverterApp {
        ConverterApp::new(AppConfig::default(), Arc::new(PngFixtureCodec))
    }

    #[test]
    fn test_validate_batch_requires_both_folders() {
        let err = validate_batch("", "/tmp/out", 95).unwrap_err();
        assert_eq!(err.tone, Tone::Warning);

        let err = validate_batch("/tmp", "   ", 95).unwrap_err();
        assert_eq!(err.tone, Tone::Warning);
    }

    #[test]
    fn test_validate_batch_rejects_missing_input() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let err = validate_batch(&missing.display().to_string(), "out", 95).unwrap_err();

        assert_eq!(err.tone, Tone::Error);
        assert!(err.body.contains("nope"));
    }

    #[test]
    fn test_validate_batch_builds_request() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().display().to_string();

        let request = validate_batch(&input, "out", 42).unwrap();

        assert_eq!(request, BatchRequest::new(temp.path(), "out", 42));
    }

    #[test]
    fn test_single_requires_output_dir() {
        assert_eq!(require_output_dir("").unwrap_err().tone, Tone::Warning);
        assert_eq!(require_output_dir(" out ").unwrap(), PathBuf::from("out"));
    }

    #[test]
    fn test_single_target_uses_stem() {
        let target = single_target(Path::new("/photos/IMG_0001.HEIC"), Path::new("/out"));
        assert_eq!(target, Path::new("/out").join("IMG_0001.jpg"));
    }

    #[test]
    fn test_batch_outcome_tones() {
        let (status, notice) = batch_outcome(&BatchTally::fatal());
        assert_eq!((status.tone, notice.tone), (Tone::Error, Tone::Error));

        let with_errors = BatchTally {
            converted: 2,
            skipped: 1,
            errors: 1,
            fatal: false,
        };
        let (status, notice) = batch_outcome(&with_errors);
        assert_eq!(status.tone, Tone::Warning);
        assert!(notice.body.contains("Errors: 1"));

        let clean = BatchTally {
            converted: 3,
            skipped: 0,
            errors: 0,
            fatal: false,
        };
        let (status, notice) = batch_outcome(&clean);
        assert_eq!(status.tone, Tone::Success);
        assert!(notice.body.contains("Converted: 3"));
    }

    #[test]
    fn test_single_outcome_tones() {
        assert_eq!(single_outcome(true).0.tone, Tone::Success);
        assert_eq!(single_outcome(false).0.tone, Tone::Error);
    }

    #[test]
    fn test_callbacks_update_log_status_and_notice() {
        let mut app = app();
        app.append_log("first".to_string());
        app.append_log("second".to_string());
        app.on_batch_done(BatchTally::new());

        assert_eq!(app.log_lines, vec!["first", "second"]);
        assert_eq!(app.status.tone, Tone::Success);
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_job_drains_into_app() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("a.heic");
        write_png_fixture(&input);
        let request = ConversionRequest::new(&input, temp.path().join("a.jpg"), 95);

        let mut app = app();
        let mut job = start_single(request, Arc::clone(&app.codec), crate::runner::noop_waker()).unwrap();
        job.dispatch_blocking(&mut app);

        assert_eq!(app.log_lines.len(), 3);
        assert_eq!(app.status, single_outcome(true).0);
        assert!(!app.is_busy());
    }
}
