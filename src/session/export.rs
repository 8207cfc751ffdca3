//! Writes the last detection result to disk as indented JSON.

use chrono::{DateTime, Utc};
use log::error;
use std::path::{Path, PathBuf};

use super::model::PredictResponse;
use super::SessionError;

pub const EXPORT_DIR: &str = "exports";

/// ISO timestamp with `-` instead of `:` so the name is valid everywhere.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "yolo_detection_results_{}.json",
        now.format("%Y-%m-%dT%H-%M-%S")
    )
}

pub fn render(result: &PredictResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn write_export(
    result: &PredictResponse,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf, SessionError> {
    let json = render(result).map_err(|e| {
        error!("could not serialize results: {e}");
        SessionError::ExportFailed
    })?;
    std::fs::create_dir_all(dir).map_err(|e| {
        error!("could not create {}: {e}", dir.display());
        SessionError::ExportFailed
    })?;
    let path = dir.join(export_file_name(now));
    std::fs::write(&path, json).map_err(|e| {
        error!("could not write {}: {e}", path.display());
        SessionError::ExportFailed
    })?;
    Ok(std::fs::canonicalize(&path).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn result() -> PredictResponse {
        PredictResponse {
            success: true,
            error: None,
            total_detections: 1,
            processing_time: 0.5,
            class_counts: BTreeMap::from([("cat".to_string(), 1)]),
            detections: Vec::new(),
        }
    }

    #[test]
    fn file_name_has_no_colons() {
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 12, 30, 45).unwrap();
        let name = export_file_name(now);
        assert_eq!(name, "yolo_detection_results_2026-08-27T12-30-45.json");
        assert!(!name.contains(':'));
    }

    #[test]
    fn render_is_indented() {
        let json = render(&result()).unwrap();
        assert!(json.contains("\n  \"success\": true"));
        assert!(json.contains("\"class_counts\""));
    }

    #[test]
    fn write_export_creates_the_directory_and_file() {
        let dir = std::env::temp_dir().join(format!("yolo_export_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 0, 0, 0).unwrap();
        let path = write_export(&result(), &dir, now).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"total_detections\": 1"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
