// Analyzer module: outer correlation, reconciliation and the price history column.

pub mod price_history;
pub mod reconcile;

pub use price_history::append_price_column;
pub use reconcile::{reconcile, CorrelatedRow, Correlation, CorrelationView};
