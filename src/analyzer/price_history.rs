use crate::analyzer::reconcile::Correlation;
use crate::model::{Catalog, IntegrityError, Presence, Price};
use crate::notifier::Notifier;

/// Adds the `date` price column to the merged table.
///
/// Rows seen in the snapshot take the snapshot price for `date`; history-only
/// rows get `-1`. Rows are matched to the correlation by `uid`.
pub fn append_price_column(
    mut merged: Catalog,
    snapshot: &Catalog,
    correlation: &Correlation,
    date: &str,
    notifier: &dyn Notifier,
) -> Result<Catalog, IntegrityError> {
    if merged.date_index(date).is_some() {
        return Err(IntegrityError::DateAlreadyRecorded(date.to_string()));
    }
    let column = snapshot
        .date_index(date)
        .ok_or_else(|| IntegrityError::MissingPriceColumn(date.to_string()))?;

    for product in &mut merged.products {
        let price = match correlation.get(&product.uid) {
            Some(row) if row.presence != Presence::HistoryOnly => {
                let observed = row
                    .snapshot
                    .and_then(|idx| snapshot.products[idx].prices.get(column).copied())
                    .unwrap_or(Price::Unobserved);
                if !observed.is_observed() {
                    notifier.price_missing(&product.uid, date);
                }
                observed
            }
            _ => Price::Unobserved,
        };
        product.prices.push(price);
    }
    merged.dates.push(date.to_string());

    Ok(merged)
}
