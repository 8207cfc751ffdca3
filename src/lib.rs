use log::warn;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tauri::{AppHandle, Emitter, Manager, State};
use tokio::sync::Mutex;

pub mod session;

use session::predict::{HttpPredictClient, PredictClient, PredictError};
use session::report::{ChartSpec, Summary, TableRow};
use session::view::{ChartTarget, SessionView};
use session::{AppConfig, SessionController};

struct AppState {
    session: Arc<Mutex<SessionController>>,
    client: Arc<dyn PredictClient>,
}

/// Forwards every view mutation to the webview as a typed event. The page
/// script is a dumb renderer; all state lives behind the controller.
struct WebviewShell {
    app: AppHandle,
}

impl WebviewShell {
    fn emit<T: Serialize + Clone>(&self, event: &str, payload: T) {
        if let Err(e) = self.app.emit(event, payload) {
            warn!("view event '{event}' failed: {e}");
        }
    }
}

impl SessionView for WebviewShell {
    fn show_preview(&self, file_name: &str, data_url: &str) {
        self.emit(
            "preview-ready",
            serde_json::json!({ "fileName": file_name, "dataUrl": data_url }),
        );
    }

    fn set_busy(&self, busy: bool) {
        self.emit("busy-changed", serde_json::json!({ "busy": busy }));
    }

    fn show_summary(&self, summary: &Summary) {
        self.emit("summary", summary.clone());
    }

    fn destroy_chart(&self, target: ChartTarget, id: u64) {
        self.emit("chart-destroy", serde_json::json!({ "target": target, "id": id }));
    }

    fn build_chart(&self, target: ChartTarget, id: u64, spec: &ChartSpec) {
        self.emit(
            "chart-build",
            serde_json::json!({ "target": target, "id": id, "spec": spec }),
        );
    }

    fn fill_table(&self, rows: &[TableRow]) {
        self.emit("table-rows", rows.to_vec());
    }

    fn reveal_results(&self) {
        self.emit("results-revealed", serde_json::json!({}));
    }

    fn show_error(&self, message: &str, dismiss_ms: u64) {
        self.emit(
            "error-show",
            serde_json::json!({ "message": message, "dismissMs": dismiss_ms }),
        );
    }

    fn hide_error(&self) {
        self.emit("error-hide", serde_json::json!({}));
    }

    fn push_success(&self, id: u64, message: &str, dismiss_ms: u64) {
        self.emit(
            "success-push",
            serde_json::json!({ "id": id, "message": message, "dismissMs": dismiss_ms }),
        );
    }

    fn remove_success(&self, id: u64) {
        self.emit("success-remove", serde_json::json!({ "id": id }));
    }

    fn reset_view(&self) {
        self.emit("session-reset", serde_json::json!({}));
    }
}

/// Turns queued auto-dismissals into delayed tasks against the shared
/// session. The generation checks inside the controller make late or
/// superseded dismissals harmless.
fn schedule_dismissals(state: &AppState, controller: &mut SessionController) {
    for dismissal in controller.take_dismissals() {
        let session = state.session.clone();
        tauri::async_runtime::spawn(async move {
            tokio::time::sleep(Duration::from_millis(dismissal.delay_ms())).await;
            session.lock().await.dismiss(dismissal);
        });
    }
}

async fn ingest_paths(state: &AppState, paths: Vec<PathBuf>) -> Result<(), String> {
    let candidates = match session::intake::gather(&paths) {
        Ok(candidates) => candidates,
        Err(e) => {
            let mut controller = state.session.lock().await;
            controller.report_error(e);
            schedule_dismissals(state, &mut controller);
            return Ok(());
        }
    };

    let job = {
        let mut controller = state.session.lock().await;
        let job = controller.ingest(candidates);
        schedule_dismissals(state, &mut controller);
        job
    };

    if let Some(job) = job {
        let path = job.path.clone();
        let read = tauri::async_runtime::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|e| e.to_string())?;
        let mut controller = state.session.lock().await;
        controller.complete_preview(job, read.map_err(|e| e.to_string()));
        schedule_dismissals(state, &mut controller);
    }
    Ok(())
}

#[tauri::command]
async fn pick_file(state: State<'_, AppState>) -> Result<(), String> {
    let picked = tauri::async_runtime::spawn_blocking(|| {
        rfd::FileDialog::new()
            .set_title("Select an image")
            .add_filter(
                "Images",
                &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"],
            )
            .pick_file()
    })
    .await
    .map_err(|e| e.to_string())?;

    match picked {
        // Dialog dismissed; nothing to report.
        None => Ok(()),
        Some(path) => ingest_paths(state.inner(), vec![path]).await,
    }
}

#[tauri::command]
async fn ingest_files(state: State<'_, AppState>, paths: Vec<String>) -> Result<(), String> {
    let paths = paths.into_iter().map(PathBuf::from).collect();
    ingest_paths(state.inner(), paths).await
}

#[tauri::command]
async fn analyze(state: State<'_, AppState>) -> Result<(), String> {
    let job = {
        let mut controller = state.session.lock().await;
        let job = controller.begin_analysis();
        schedule_dismissals(state.inner(), &mut controller);
        job
    };
    let Some(job) = job else {
        return Ok(());
    };

    let client = state.client.clone();
    let work = job.clone();
    let outcome = tauri::async_runtime::spawn_blocking(move || {
        let bytes = match work.data {
            Some(bytes) => bytes,
            None => std::fs::read(&work.path).map_err(|e| PredictError::LocalRead(e.to_string()))?,
        };
        client.predict(&work.file_name, &work.mime, &bytes)
    })
    .await
    .map_err(|e| e.to_string())?;

    let mut controller = state.session.lock().await;
    controller.finish_analysis(job, outcome);
    schedule_dismissals(state.inner(), &mut controller);
    Ok(())
}

#[tauri::command]
async fn reset_session(state: State<'_, AppState>) -> Result<(), String> {
    let mut controller = state.session.lock().await;
    controller.reset();
    schedule_dismissals(state.inner(), &mut controller);
    Ok(())
}

#[tauri::command]
async fn export_results(state: State<'_, AppState>) -> Result<(), String> {
    let path = {
        let mut controller = state.session.lock().await;
        let path = controller.export(chrono::Utc::now());
        schedule_dismissals(state.inner(), &mut controller);
        path
    };
    if let Some(path) = path {
        if let Err(e) = tauri_plugin_opener::reveal_item_in_dir(&path) {
            warn!("could not reveal {}: {e}", path.display());
        }
    }
    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let config = AppConfig::load();
            let shell: Arc<dyn SessionView> = Arc::new(WebviewShell {
                app: app.handle().clone(),
            });
            app.manage(AppState {
                session: Arc::new(Mutex::new(SessionController::new(shell))),
                client: Arc::new(HttpPredictClient::new(&config)),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            pick_file,
            ingest_files,
            analyze,
            reset_session,
            export_results
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
