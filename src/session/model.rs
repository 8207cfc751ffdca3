use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One predicted object instance. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Payload returned by the `/predict/` endpoint. The server reports logical
/// failures with `success: false` and an `error` message; every other field
/// defaults so a failure body still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub class_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_body_deserializes_without_detection_fields() {
        let parsed: PredictResponse =
            serde_json::from_str(r#"{"success": false, "error": "model unavailable"}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("model unavailable"));
        assert!(parsed.detections.is_empty());
        assert_eq!(parsed.total_detections, 0);
    }

    #[test]
    fn success_body_keeps_detection_order() {
        let raw = r#"{
            "success": true,
            "total_detections": 2,
            "processing_time": 0.34,
            "class_counts": {"cat": 1, "dog": 1},
            "detections": [
                {"class_name": "dog", "confidence": 0.62, "bbox": {"x": 50, "y": 60, "width": 70, "height": 80}},
                {"class_name": "cat", "confidence": 0.91, "bbox": {"x": 10, "y": 20, "width": 30, "height": 40}}
            ]
        }"#;
        let parsed: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.detections[0].class_name, "dog");
        assert_eq!(parsed.detections[1].class_name, "cat");
        assert_eq!(parsed.class_counts.len(), 2);
    }
}
