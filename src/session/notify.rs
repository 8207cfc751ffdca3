//! Transient banner bookkeeping. Errors share one banner whose auto-hide is
//! cancelled by replacement or an explicit hide; successes stack
//! independently. The two channels never hide each other.

use parking_lot::Mutex;

use super::view::SessionView;

pub const ERROR_DISMISS_MS: u64 = 5_000;
pub const SUCCESS_DISMISS_MS: u64 = 3_000;

#[derive(Debug, Default)]
struct ErrorBanner {
    generation: u64,
    visible: bool,
}

#[derive(Debug, Default)]
pub struct Notifier {
    error: Mutex<ErrorBanner>,
    next_success: Mutex<u64>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows (or replaces) the error banner and returns the generation to
    /// hand to `expire_error` after the dismiss delay.
    pub fn error(&self, view: &dyn SessionView, message: &str) -> u64 {
        let mut banner = self.error.lock();
        banner.generation += 1;
        banner.visible = true;
        view.show_error(message, ERROR_DISMISS_MS);
        banner.generation
    }

    /// No-op when the banner was replaced or hidden since `generation`.
    pub fn expire_error(&self, view: &dyn SessionView, generation: u64) {
        let mut banner = self.error.lock();
        if banner.visible && banner.generation == generation {
            banner.visible = false;
            view.hide_error();
        }
    }

    pub fn hide_error(&self, view: &dyn SessionView) {
        let mut banner = self.error.lock();
        if banner.visible {
            banner.visible = false;
            view.hide_error();
        }
    }

    pub fn success(&self, view: &dyn SessionView, message: &str) -> u64 {
        let mut next = self.next_success.lock();
        *next += 1;
        view.push_success(*next, message, SUCCESS_DISMISS_MS);
        *next
    }

    pub fn expire_success(&self, view: &dyn SessionView, id: u64) {
        view.remove_success(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::report::{ChartSpec, Summary, TableRow};
    use crate::session::view::ChartTarget;

    #[derive(Default)]
    struct BannerView {
        shows: Mutex<Vec<String>>,
        hides: Mutex<u64>,
        successes: Mutex<Vec<u64>>,
    }

    impl SessionView for BannerView {
        fn show_preview(&self, _: &str, _: &str) {}
        fn set_busy(&self, _: bool) {}
        fn show_summary(&self, _: &Summary) {}
        fn destroy_chart(&self, _: ChartTarget, _: u64) {}
        fn build_chart(&self, _: ChartTarget, _: u64, _: &ChartSpec) {}
        fn fill_table(&self, _: &[TableRow]) {}
        fn reveal_results(&self) {}
        fn show_error(&self, message: &str, _: u64) {
            self.shows.lock().push(message.to_string());
        }
        fn hide_error(&self) {
            *self.hides.lock() += 1;
        }
        fn push_success(&self, id: u64, _: &str, _: u64) {
            self.successes.lock().push(id);
        }
        fn remove_success(&self, _: u64) {}
        fn reset_view(&self) {}
    }

    #[test]
    fn replaced_banner_ignores_the_stale_expiry() {
        let notifier = Notifier::new();
        let view = BannerView::default();
        let first = notifier.error(&view, "first");
        let second = notifier.error(&view, "second");
        notifier.expire_error(&view, first);
        assert_eq!(*view.hides.lock(), 0, "stale expiry must not hide the new banner");
        notifier.expire_error(&view, second);
        assert_eq!(*view.hides.lock(), 1);
    }

    #[test]
    fn explicit_hide_wins_over_the_pending_expiry() {
        let notifier = Notifier::new();
        let view = BannerView::default();
        let generation = notifier.error(&view, "oops");
        notifier.hide_error(&view);
        notifier.expire_error(&view, generation);
        assert_eq!(*view.hides.lock(), 1);
    }

    #[test]
    fn hide_without_a_banner_is_a_no_op() {
        let notifier = Notifier::new();
        let view = BannerView::default();
        notifier.hide_error(&view);
        assert_eq!(*view.hides.lock(), 0);
    }

    #[test]
    fn successes_stack_with_distinct_ids() {
        let notifier = Notifier::new();
        let view = BannerView::default();
        notifier.success(&view, "one");
        notifier.success(&view, "two");
        assert_eq!(*view.successes.lock(), vec![1, 2]);
        assert_eq!(*view.hides.lock(), 0, "successes never hide the error banner");
    }
}
