//! Folds a freshly scraped catalog snapshot into the accumulated price
//! history, appends the snapshot's dated price column and labels every row
//! with a brand.
//!
//! Loader -> reconcile -> price history -> brand classification -> sink.
//! Every run recomputes the whole table from the two input files.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod notifier;
pub mod storage;
pub mod utils;

use analyzer::{append_price_column, reconcile, Correlation, CorrelationView};
use config::{load_brands, BrandCatalog};
use model::{Catalog, PipelineError, TableRole};
use normalizer::{brand_distribution, classify_all};
use notifier::Notifier;
use std::path::PathBuf;
use storage::{output_path, CsvStorage, Sink, TableLoader};

pub use model::{MergeSummary, Presence, Price, Product};

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub history_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub category: String,
    pub date: String,
    pub out_dir: PathBuf,
    pub brands_path: Option<PathBuf>,
    pub dump_correlation: Option<PathBuf>,
}

/// Reconciles `snapshot` into `history`, adds the `date` price column and
/// classifies brands with the keywords for `category`.
pub fn merge(
    history: Catalog,
    snapshot: Catalog,
    category: &str,
    date: &str,
    brands: &BrandCatalog,
    notifier: &dyn Notifier,
) -> Result<Catalog, PipelineError> {
    let (merged, _) = merge_tables(history, snapshot, category, date, brands, notifier, false)?;
    Ok(merged)
}

/// Like [`merge`], but also returns the correlated view the merge was built from.
pub fn merge_with_view(
    history: Catalog,
    snapshot: Catalog,
    category: &str,
    date: &str,
    brands: &BrandCatalog,
    notifier: &dyn Notifier,
) -> Result<(Catalog, CorrelationView), PipelineError> {
    let (merged, view) = merge_tables(history, snapshot, category, date, brands, notifier, true)?;
    Ok((merged, view.unwrap_or_default()))
}

fn merge_tables(
    history: Catalog,
    snapshot: Catalog,
    category: &str,
    date: &str,
    brands: &BrandCatalog,
    notifier: &dyn Notifier,
    keep_view: bool,
) -> Result<(Catalog, Option<CorrelationView>), PipelineError> {
    let keywords = brands.keywords(category)?;

    let correlation = Correlation::build(&history, &snapshot)?;
    let view = keep_view.then(|| correlation.view(&history, &snapshot));
    let (merged, summary) = reconcile(history, &snapshot, &correlation)?;
    notifier.reconciled(&summary);

    let merged = append_price_column(merged, &snapshot, &correlation, date, notifier)?;

    let classified = classify_all(merged, keywords);
    notifier.classified(category, &brand_distribution(&classified));
    Ok((classified, view))
}

/// Loads both tables, merges them and writes `<out_dir>/<category>_db.csv`,
/// then the correlation dump when one was asked for. Returns the path
/// written. Nothing is written if any step of the merge fails.
pub fn run(config: &RunConfig, notifier: &dyn Notifier) -> Result<PathBuf, PipelineError> {
    let brands = load_brands(config.brands_path.as_deref())?;
    let storage = CsvStorage::new();

    let history = storage.load(&config.history_path)?;
    notifier.loaded(TableRole::History, &config.history_path, history.len());
    let snapshot = storage.load(&config.snapshot_path)?;
    notifier.loaded(TableRole::Snapshot, &config.snapshot_path, snapshot.len());

    let (merged, view) = if config.dump_correlation.is_some() {
        let (merged, view) =
            merge_with_view(history, snapshot, &config.category, &config.date, &brands, notifier)?;
        (merged, Some(view))
    } else {
        let merged = merge(history, snapshot, &config.category, &config.date, &brands, notifier)?;
        (merged, None)
    };

    let path = output_path(&config.out_dir, &config.category);
    storage.write(&merged, &path)?;
    notifier.written(&path, merged.len());

    if let (Some(dump), Some(view)) = (&config.dump_correlation, &view) {
        storage.dump_correlation(view, dump)?;
    }
    Ok(path)
}
