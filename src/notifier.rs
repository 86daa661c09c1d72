use crate::model::{MergeSummary, TableRole};
use std::path::Path;
use tracing::{info, warn, Span};

/// Receives progress events for a single merge run.
pub trait Notifier {
    fn loaded(&self, role: TableRole, path: &Path, rows: usize);
    fn reconciled(&self, summary: &MergeSummary);
    fn price_missing(&self, uid: &str, date: &str);
    fn classified(&self, category: &str, distribution: &[(String, usize)]);
    fn written(&self, path: &Path, rows: usize);
}

/// Forwards run events to `tracing` inside a span scoped to the run.
pub struct TracingNotifier {
    span: Span,
}

impl TracingNotifier {
    pub fn new(category: &str, date: &str) -> Self {
        Self {
            span: tracing::info_span!("merge", category, date),
        }
    }
}

impl Notifier for TracingNotifier {
    fn loaded(&self, role: TableRole, path: &Path, rows: usize) {
        let _enter = self.span.enter();
        info!("Read {} file {} ({} articles)", role, path.display(), rows);
    }

    fn reconciled(&self, summary: &MergeSummary) {
        let _enter = self.span.enter();
        info!(
            "Merge: {} history / {} today articles -> {} history_only, {} snapshot_only, {} both",
            summary.history_rows,
            summary.snapshot_rows,
            summary.history_only,
            summary.snapshot_only,
            summary.both
        );
        info!("New products added: {}", summary.new_products);
        if summary.duplicates_dropped > 0 {
            info!("Dropped {} rows with an already known link", summary.duplicates_dropped);
        }
    }

    fn price_missing(&self, uid: &str, date: &str) {
        let _enter = self.span.enter();
        warn!("uid {} has no price for {}, recording -1", uid, date);
    }

    fn classified(&self, category: &str, distribution: &[(String, usize)]) {
        let _enter = self.span.enter();
        info!("Brands for {}:", category);
        for (marca, count) in distribution {
            info!("  {}: {}", marca, count);
        }
    }

    fn written(&self, path: &Path, rows: usize) {
        let _enter = self.span.enter();
        info!("Wrote {} articles to {}", rows, path.display());
    }
}

/// Discards every event.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn loaded(&self, _role: TableRole, _path: &Path, _rows: usize) {}
    fn reconciled(&self, _summary: &MergeSummary) {}
    fn price_missing(&self, _uid: &str, _date: &str) {}
    fn classified(&self, _category: &str, _distribution: &[(String, usize)]) {}
    fn written(&self, _path: &Path, _rows: usize) {}
}
