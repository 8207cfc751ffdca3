//! The page session: one selected file, one detection result, two chart
//! slots, all owned by a single controller. Suspension points (file read,
//! network call, dialog) run outside the controller; their completions carry
//! the epoch they started under and are dropped when the session has moved
//! on, so a stale read or response can never overwrite newer UI state.

pub mod export;
pub mod intake;
pub mod model;
pub mod notify;
pub mod predict;
pub mod report;
pub mod view;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use self::intake::FileCandidate;
use self::model::PredictResponse;
use self::notify::{Notifier, ERROR_DISMISS_MS, SUCCESS_DISMISS_MS};
use self::predict::PredictError;
use self::view::{ChartSlot, ChartTarget, SessionView};

pub const CONFIG_FILE: &str = "detector_config.json";
pub const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:8000/predict/";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_predict_url")]
    pub predict_url: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

fn default_predict_url() -> String {
    DEFAULT_PREDICT_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predict_url: default_predict_url(),
            csrf_token: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("invalid {CONFIG_FILE}: {e}; using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no {CONFIG_FILE} found; using defaults");
                Self::default()
            }
        }
    }
}

/// The single in-flight image. Bytes are filled in once the preview read
/// completes; the dispatcher falls back to re-reading the path if they are
/// missing.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub mime: String,
    pub size: u64,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No files selected.")]
    NoFiles,
    #[error("Multiple files detected. Only the first file will be processed.")]
    ExtraFiles,
    #[error("Please select a valid image file. Supported formats: JPG, PNG, GIF, WebP, etc.")]
    NotAnImage,
    #[error("File size too large. Maximum size is 10MB.")]
    TooLarge,
    #[error("The selected file appears to be empty. Please select a valid image file.")]
    EmptyFile,
    #[error("Error reading the selected file.")]
    ReadFailed,
    #[error("Error displaying image preview.")]
    PreviewFailed,
    #[error("Please select an image first.")]
    NoSelection,
    #[error("No results to download.")]
    NoResults,
    #[error("Could not write the export file.")]
    ExportFailed,
}

/// Ticket for an in-flight preview read.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    pub epoch: u64,
    pub path: PathBuf,
}

/// Ticket for an in-flight predict request.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub epoch: u64,
    pub file_name: String,
    pub mime: String,
    pub path: PathBuf,
    pub data: Option<Vec<u8>>,
}

/// Auto-dismiss work the caller must schedule after the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    Error { generation: u64 },
    Success { id: u64 },
}

impl Dismissal {
    pub fn delay_ms(&self) -> u64 {
        match self {
            Dismissal::Error { .. } => ERROR_DISMISS_MS,
            Dismissal::Success { .. } => SUCCESS_DISMISS_MS,
        }
    }
}

pub struct SessionController {
    view: Arc<dyn SessionView>,
    notifier: Notifier,
    selected: Option<SelectedFile>,
    result: Option<PredictResponse>,
    class_chart: ChartSlot,
    confidence_chart: ChartSlot,
    epoch: u64,
    analyzing: bool,
    pending: Vec<Dismissal>,
}

impl SessionController {
    pub fn new(view: Arc<dyn SessionView>) -> Self {
        Self {
            view,
            notifier: Notifier::new(),
            selected: None,
            result: None,
            class_chart: ChartSlot::new(ChartTarget::ClassDistribution),
            confidence_chart: ChartSlot::new(ChartTarget::ConfidenceHistogram),
            epoch: 0,
            analyzing: false,
            pending: Vec::new(),
        }
    }

    // --- intake ---

    /// Validates the candidate list and stores the selection. Returns the
    /// preview read to run off the UI thread, or `None` when rejected.
    pub fn ingest(&mut self, candidates: Vec<FileCandidate>) -> Option<PreviewJob> {
        if candidates.is_empty() {
            self.report_error(SessionError::NoFiles);
            return None;
        }
        if candidates.len() > 1 {
            warn!("{} files offered, keeping the first", candidates.len());
            self.report_error(SessionError::ExtraFiles);
        }
        let candidate = &candidates[0];
        let file = match intake::validate(candidate) {
            Ok(file) => file,
            Err(e) => {
                self.report_error(e);
                return None;
            }
        };

        // Replacing the selection invalidates whatever was in flight.
        self.epoch += 1;
        let name = file.name.clone();
        let path = file.path.clone();
        info!("selected {} ({} bytes, {})", name, file.size, file.mime);
        self.selected = Some(file);
        self.notify_success(&format!("File \"{name}\" loaded successfully!"));
        Some(PreviewJob {
            epoch: self.epoch,
            path,
        })
    }

    /// Completion of the preview read. A read or decode failure keeps the
    /// selection (the upload can still proceed) but shows no preview.
    pub fn complete_preview(&mut self, job: PreviewJob, read: Result<Vec<u8>, String>) {
        if job.epoch != self.epoch {
            info!("dropping stale preview for {}", job.path.display());
            return;
        }
        let Some(name) = self.selected.as_ref().map(|f| f.name.clone()) else {
            warn!("preview completed without a selection");
            return;
        };
        match read {
            Err(e) => {
                warn!("reading {} failed: {e}", job.path.display());
                self.report_error(SessionError::ReadFailed);
            }
            Ok(bytes) => {
                let url = intake::preview_data_url(&bytes);
                if let Some(file) = self.selected.as_mut() {
                    file.data = Some(bytes);
                }
                match url {
                    Ok(url) => self.view.show_preview(&name, &url),
                    Err(e) => self.report_error(e),
                }
            }
        }
    }

    // --- analysis ---

    /// Checks the preconditions, flips the busy state and hands back the
    /// request to run off the UI thread. The busy flag is cooperative: it
    /// mirrors the disabled trigger control in the view.
    pub fn begin_analysis(&mut self) -> Option<AnalysisJob> {
        if self.analyzing {
            warn!("analysis already running, trigger ignored");
            return None;
        }
        let Some(file) = &self.selected else {
            self.report_error(SessionError::NoSelection);
            return None;
        };
        let job = AnalysisJob {
            epoch: self.epoch,
            file_name: file.name.clone(),
            mime: file.mime.clone(),
            path: file.path.clone(),
            data: file.data.clone(),
        };
        self.analyzing = true;
        self.view.set_busy(true);
        self.notifier.hide_error(self.view.as_ref());
        Some(job)
    }

    /// Completion of the predict request. The busy state is restored on
    /// every path, including when a replacement selection superseded the
    /// request while it was in flight; only the outcome handling is dropped
    /// for a stale epoch. After a reset `analyzing` is already false and the
    /// view was restored there, so nothing is re-emitted.
    pub fn finish_analysis(
        &mut self,
        job: AnalysisJob,
        outcome: Result<PredictResponse, PredictError>,
    ) {
        if self.analyzing {
            self.analyzing = false;
            self.view.set_busy(false);
        }
        if job.epoch != self.epoch {
            warn!("dropping stale analysis response for {}", job.file_name);
            return;
        }
        match outcome {
            Ok(response) if response.success => {
                info!(
                    "{} detections in {}s",
                    response.total_detections, response.processing_time
                );
                self.render_results(&response);
                self.result = Some(response);
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Analysis failed. Please try again.".to_string());
                self.notify_error(&message);
            }
            Err(PredictError::LocalRead(e)) => {
                warn!("could not read the upload bytes: {e}");
                self.report_error(SessionError::ReadFailed);
            }
            Err(e) => {
                warn!("predict request failed: {e}");
                self.notify_error("Network error. Please check your connection and try again.");
            }
        }
    }

    fn render_results(&mut self, response: &PredictResponse) {
        let report = report::build_report(response);
        self.view.show_summary(&report.summary);
        self.class_chart.install(&report.class_chart, self.view.as_ref());
        self.confidence_chart
            .install(&report.confidence_chart, self.view.as_ref());
        self.view.fill_table(&report.rows);
        self.view.reveal_results();
    }

    // --- reset ---

    /// Returns the session to its resting state. Idempotent.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.selected = None;
        self.result = None;
        self.analyzing = false;
        self.class_chart.clear(self.view.as_ref());
        self.confidence_chart.clear(self.view.as_ref());
        self.notifier.hide_error(self.view.as_ref());
        self.view.reset_view();
    }

    // --- export ---

    pub fn export(&mut self, now: DateTime<Utc>) -> Option<PathBuf> {
        let Some(result) = self.result.clone() else {
            self.report_error(SessionError::NoResults);
            return None;
        };
        match export::write_export(&result, Path::new(export::EXPORT_DIR), now) {
            Ok(path) => {
                self.notify_success(&format!("Results saved to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                self.report_error(e);
                None
            }
        }
    }

    // --- notifications ---

    pub fn report_error(&mut self, error: SessionError) {
        self.notify_error(&error.to_string());
    }

    fn notify_error(&mut self, message: &str) {
        let generation = self.notifier.error(self.view.as_ref(), message);
        self.pending.push(Dismissal::Error { generation });
    }

    fn notify_success(&mut self, message: &str) {
        let id = self.notifier.success(self.view.as_ref(), message);
        self.pending.push(Dismissal::Success { id });
    }

    /// Auto-dismiss work queued by the last call; the caller schedules each
    /// entry after its delay and feeds it back through [`Self::dismiss`].
    pub fn take_dismissals(&mut self) -> Vec<Dismissal> {
        std::mem::take(&mut self.pending)
    }

    pub fn dismiss(&mut self, dismissal: Dismissal) {
        match dismissal {
            Dismissal::Error { generation } => {
                self.notifier.expire_error(self.view.as_ref(), generation)
            }
            Dismissal::Success { id } => self.notifier.expire_success(self.view.as_ref(), id),
        }
    }

    // --- inspection (used by the integration tests) ---

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn last_result(&self) -> Option<&PredictResponse> {
        self.result.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn live_charts(&self) -> (Option<u64>, Option<u64>) {
        (self.class_chart.live(), self.confidence_chart.live())
    }
}
