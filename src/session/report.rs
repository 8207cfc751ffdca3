//! Turns a successful `PredictResponse` into the display payloads the view
//! renders: summary statistics, the two chart specs and the table rows.

use serde::Serialize;

use super::model::{Detection, PredictResponse};
use std::collections::BTreeMap;

pub const CONFIDENCE_BUCKET_LABELS: [&str; 5] =
    ["0-20%", "21-40%", "41-60%", "61-80%", "81-100%"];

// Warm colors for low confidence, green for high.
pub const CONFIDENCE_BUCKET_COLORS: [&str; 5] =
    ["#dc3545", "#fd7e14", "#ffc107", "#20c997", "#28a745"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Doughnut,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_detections: u64,
    pub unique_classes: usize,
    pub processing_time: String,
    pub avg_confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub index: usize,
    pub class_name: String,
    pub confidence_percent: f64,
    pub confidence_label: String,
    pub position: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub class_chart: ChartSpec,
    pub confidence_chart: ChartSpec,
    pub rows: Vec<TableRow>,
}

pub fn build_report(response: &PredictResponse) -> AnalysisReport {
    AnalysisReport {
        summary: summarize(response),
        class_chart: class_chart(&response.class_counts),
        confidence_chart: confidence_chart(&response.detections),
        rows: table_rows(&response.detections),
    }
}

pub fn summarize(response: &PredictResponse) -> Summary {
    Summary {
        total_detections: response.total_detections,
        unique_classes: response.class_counts.len(),
        processing_time: format!("{}s", response.processing_time),
        avg_confidence: average_confidence(&response.detections),
    }
}

/// One-decimal percent, `0%` for an empty set so the summary never shows NaN.
pub fn average_confidence(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return "0%".to_string();
    }
    let sum: f64 = detections.iter().map(|d| d.confidence).sum();
    format!("{:.1}%", sum / detections.len() as f64 * 100.0)
}

/// One category per class, one hue per category spaced evenly around the
/// color wheel.
pub fn class_chart(class_counts: &BTreeMap<String, u64>) -> ChartSpec {
    let labels: Vec<String> = class_counts.keys().cloned().collect();
    let values: Vec<u64> = class_counts.values().copied().collect();
    let colors = generate_colors(labels.len());
    ChartSpec {
        kind: ChartKind::Doughnut,
        labels,
        values,
        colors,
    }
}

pub fn generate_colors(count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    let hue_step = 360.0 / count as f64;
    (0..count)
        .map(|i| format!("hsl({}, 70%, 60%)", i as f64 * hue_step))
        .collect()
}

/// Five fixed buckets over the rounded confidence percentage. The boundary
/// is inclusive on the lower bucket: exactly 20% lands in `0-20%`.
pub fn bucket_index(confidence: f64) -> usize {
    let percent = (confidence * 100.0).round() as i64;
    match percent {
        p if p <= 20 => 0,
        p if p <= 40 => 1,
        p if p <= 60 => 2,
        p if p <= 80 => 3,
        _ => 4,
    }
}

pub fn confidence_chart(detections: &[Detection]) -> ChartSpec {
    let mut counts = [0u64; 5];
    for detection in detections {
        counts[bucket_index(detection.confidence)] += 1;
    }
    ChartSpec {
        kind: ChartKind::Bar,
        labels: CONFIDENCE_BUCKET_LABELS.iter().map(|s| s.to_string()).collect(),
        values: counts.to_vec(),
        colors: CONFIDENCE_BUCKET_COLORS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Rows in received order, nothing re-sorted.
pub fn table_rows(detections: &[Detection]) -> Vec<TableRow> {
    detections
        .iter()
        .enumerate()
        .map(|(i, d)| TableRow {
            index: i + 1,
            class_name: d.class_name.clone(),
            confidence_percent: d.confidence * 100.0,
            confidence_label: format!("{:.1}%", d.confidence * 100.0),
            position: format!("({:.1}, {:.1})", d.bbox.x, d.bbox.y),
            size: format!("{:.1} × {:.1}", d.bbox.width, d.bbox.height),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::BoundingBox;

    fn det(class: &str, confidence: f64) -> Detection {
        Detection {
            class_name: class.to_string(),
            confidence,
            bbox: BoundingBox {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0,
            },
        }
    }

    #[test]
    fn average_confidence_of_nothing_is_zero_percent() {
        assert_eq!(average_confidence(&[]), "0%");
    }

    #[test]
    fn average_confidence_has_one_decimal() {
        assert_eq!(average_confidence(&[det("cat", 0.91), det("dog", 0.62)]), "76.5%");
    }

    #[test]
    fn bucket_boundaries_are_inclusive_on_the_lower_bucket() {
        assert_eq!(bucket_index(0.20), 0);
        assert_eq!(bucket_index(0.205), 1, "20.5% rounds up into 21-40%");
        assert_eq!(bucket_index(0.40), 1);
        assert_eq!(bucket_index(0.41), 2);
        assert_eq!(bucket_index(0.804), 3);
        assert_eq!(bucket_index(0.805), 4);
        assert_eq!(bucket_index(1.0), 4);
        assert_eq!(bucket_index(0.0), 0);
    }

    #[test]
    fn confidence_chart_counts_per_bucket() {
        let spec = confidence_chart(&[det("a", 0.05), det("b", 0.55), det("c", 0.95), det("d", 0.99)]);
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.values, vec![1, 0, 1, 0, 2]);
        assert_eq!(spec.colors.len(), 5);
    }

    #[test]
    fn class_chart_spaces_hues_evenly() {
        let mut counts = BTreeMap::new();
        counts.insert("cat".to_string(), 1);
        counts.insert("dog".to_string(), 2);
        counts.insert("person".to_string(), 3);
        let spec = class_chart(&counts);
        assert_eq!(spec.kind, ChartKind::Doughnut);
        assert_eq!(spec.labels, vec!["cat", "dog", "person"]);
        assert_eq!(spec.values, vec![1, 2, 3]);
        assert_eq!(spec.colors[0], "hsl(0, 70%, 60%)");
        assert_eq!(spec.colors[1], "hsl(120, 70%, 60%)");
        assert_eq!(spec.colors[2], "hsl(240, 70%, 60%)");
    }

    #[test]
    fn table_rows_keep_order_and_format_one_decimal() {
        let rows = table_rows(&[det("cat", 0.91), det("dog", 0.625)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].class_name, "cat");
        assert_eq!(rows[0].confidence_label, "91.0%");
        assert_eq!(rows[0].position, "(10.0, 20.0)");
        assert_eq!(rows[0].size, "30.0 × 40.0");
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].confidence_label, "62.5%");
    }

    #[test]
    fn summary_appends_seconds_unit() {
        let response = PredictResponse {
            success: true,
            error: None,
            total_detections: 0,
            processing_time: 0.34,
            class_counts: BTreeMap::new(),
            detections: Vec::new(),
        };
        let summary = summarize(&response);
        assert_eq!(summary.processing_time, "0.34s");
        assert_eq!(summary.avg_confidence, "0%");
    }
}
