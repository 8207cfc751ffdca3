//! Typed view surface. The controller never touches page elements by name;
//! it talks to a `SessionView` injected once at startup. The production
//! implementation forwards each call to the webview as an event, the tests
//! record the calls.

use serde::Serialize;

use super::report::{ChartSpec, Summary, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartTarget {
    ClassDistribution,
    ConfidenceHistogram,
}

pub trait SessionView: Send + Sync {
    fn show_preview(&self, file_name: &str, data_url: &str);
    fn set_busy(&self, busy: bool);
    fn show_summary(&self, summary: &Summary);
    fn destroy_chart(&self, target: ChartTarget, id: u64);
    fn build_chart(&self, target: ChartTarget, id: u64, spec: &ChartSpec);
    fn fill_table(&self, rows: &[TableRow]);
    fn reveal_results(&self);
    fn show_error(&self, message: &str, dismiss_ms: u64);
    fn hide_error(&self);
    fn push_success(&self, id: u64, message: &str, dismiss_ms: u64);
    fn remove_success(&self, id: u64);
    fn reset_view(&self);
}

/// Owns whatever chart instance is live on one canvas. Installing a new spec
/// first destroys the previous instance, so the canvas never carries two
/// overlapping charts.
#[derive(Debug)]
pub struct ChartSlot {
    target: ChartTarget,
    live: Option<u64>,
    next_id: u64,
}

impl ChartSlot {
    pub fn new(target: ChartTarget) -> Self {
        Self {
            target,
            live: None,
            next_id: 1,
        }
    }

    pub fn install(&mut self, spec: &ChartSpec, view: &dyn SessionView) {
        if let Some(old) = self.live.take() {
            view.destroy_chart(self.target, old);
        }
        let id = self.next_id;
        self.next_id += 1;
        view.build_chart(self.target, id, spec);
        self.live = Some(id);
    }

    pub fn clear(&mut self, view: &dyn SessionView) {
        if let Some(old) = self.live.take() {
            view.destroy_chart(self.target, old);
        }
    }

    pub fn live(&self) -> Option<u64> {
        self.live
    }
}
