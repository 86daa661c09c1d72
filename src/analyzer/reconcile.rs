use crate::model::{
    Catalog, IntegrityError, MergeSummary, Presence, Price, Product, TableRole, DESCRIPTIVE_COLUMNS,
    UID_COLUMN,
};
use crate::utils::format_price;
use std::collections::{HashMap, HashSet};

pub const HISTORY_SUFFIX: &str = "_db";
pub const SNAPSHOT_SUFFIX: &str = "_t";
pub const INDICATOR_COLUMN: &str = "_merge";

/// One `uid` of the outer correlation, pointing back into the input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedRow {
    pub uid: String,
    pub presence: Presence,
    pub history: Option<usize>,
    pub snapshot: Option<usize>,
}

/// Full outer correlation of history and snapshot on `uid`.
///
/// Rows follow history order, then the snapshot-only rows in snapshot order,
/// which is the order the merged table is concatenated in.
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    pub rows: Vec<CorrelatedRow>,
    by_uid: HashMap<String, usize>,
}

impl Correlation {
    pub fn build(history: &Catalog, snapshot: &Catalog) -> Result<Self, IntegrityError> {
        let history_index = index_by_uid(history, TableRole::History)?;
        let snapshot_index = index_by_uid(snapshot, TableRole::Snapshot)?;

        let mut rows = Vec::with_capacity(history.len() + snapshot.len());
        for (idx, product) in history.products.iter().enumerate() {
            let matched = snapshot_index.get(product.uid.as_str()).copied();
            rows.push(CorrelatedRow {
                uid: product.uid.clone(),
                presence: if matched.is_some() { Presence::Both } else { Presence::HistoryOnly },
                history: Some(idx),
                snapshot: matched,
            });
        }
        for (idx, product) in snapshot.products.iter().enumerate() {
            if history_index.contains_key(product.uid.as_str()) {
                continue;
            }
            rows.push(CorrelatedRow {
                uid: product.uid.clone(),
                presence: Presence::SnapshotOnly,
                history: None,
                snapshot: Some(idx),
            });
        }

        let by_uid = rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.uid.clone(), pos))
            .collect();
        Ok(Self { rows, by_uid })
    }

    pub fn get(&self, uid: &str) -> Option<&CorrelatedRow> {
        self.by_uid.get(uid).map(|&pos| &self.rows[pos])
    }

    pub fn count(&self, presence: Presence) -> usize {
        self.rows.iter().filter(|r| r.presence == presence).count()
    }

    /// Header of the correlated view. Column names present on both sides carry
    /// `_db` (history) or `_t` (snapshot) suffixes.
    pub fn headers(history: &Catalog, snapshot: &Catalog) -> Vec<String> {
        let left = side_columns(history);
        let right = side_columns(snapshot);

        let mut headers = vec![UID_COLUMN.to_string()];
        headers.extend(left.iter().map(|name| {
            if right.contains(name) {
                format!("{name}{HISTORY_SUFFIX}")
            } else {
                name.clone()
            }
        }));
        headers.extend(right.iter().map(|name| {
            if left.contains(name) {
                format!("{name}{SNAPSHOT_SUFFIX}")
            } else {
                name.clone()
            }
        }));
        headers.push(INDICATOR_COLUMN.to_string());
        headers
    }

    /// Cells of one correlated row, aligned with `headers`. The side a row is
    /// absent from is left empty.
    pub fn cells(&self, row: &CorrelatedRow, history: &Catalog, snapshot: &Catalog) -> Vec<String> {
        let mut cells = vec![row.uid.clone()];
        cells.extend(side_cells(row.history.map(|i| &history.products[i]), history));
        cells.extend(side_cells(row.snapshot.map(|i| &snapshot.products[i]), snapshot));
        cells.push(row.presence.to_string());
        cells
    }

    /// Renders the whole correlated view as text.
    pub fn view(&self, history: &Catalog, snapshot: &Catalog) -> CorrelationView {
        CorrelationView {
            headers: Self::headers(history, snapshot),
            rows: self
                .rows
                .iter()
                .map(|row| self.cells(row, history, snapshot))
                .collect(),
        }
    }
}

/// Text rendering of a `Correlation`, kept for the debug dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn index_by_uid(catalog: &Catalog, role: TableRole) -> Result<HashMap<&str, usize>, IntegrityError> {
    let mut index = HashMap::with_capacity(catalog.len());
    for (idx, product) in catalog.products.iter().enumerate() {
        if index.insert(product.uid.as_str(), idx).is_some() {
            return Err(IntegrityError::DuplicateUid {
                table: role,
                uid: product.uid.clone(),
            });
        }
    }
    Ok(index)
}

fn side_columns(catalog: &Catalog) -> Vec<String> {
    DESCRIPTIVE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(catalog.extras.iter().cloned())
        .chain(catalog.dates.iter().cloned())
        .collect()
}

fn side_cells(product: Option<&Product>, catalog: &Catalog) -> Vec<String> {
    match product {
        Some(p) => p
            .descriptive()
            .into_iter()
            .map(str::to_string)
            .chain(p.extras.iter().cloned())
            .chain(p.prices.iter().map(|&price| format_price(price)))
            .collect(),
        None => {
            let width = DESCRIPTIVE_COLUMNS.len() + catalog.extras.len() + catalog.dates.len();
            vec![String::new(); width]
        }
    }
}

fn ensure_unique_links(products: &[Product], role: TableRole) -> Result<(), IntegrityError> {
    let mut seen = HashSet::with_capacity(products.len());
    for product in products {
        if !seen.insert(product.link.as_str()) {
            return Err(IntegrityError::DuplicateLink {
                table: role,
                link: product.link.clone(),
            });
        }
    }
    Ok(())
}

/// Folds the snapshot-only products into history.
///
/// New rows copy `categoria`, `producto`, `link` and `imagen` from the
/// snapshot and get `-1` for every history date. Every empty cell of the
/// concatenated table, price or text, is filled with `-1`. Afterwards rows
/// are deduplicated by `link`, keeping the first one, so history wins on a
/// collision with a new row.
pub fn reconcile(
    history: Catalog,
    snapshot: &Catalog,
    correlation: &Correlation,
) -> Result<(Catalog, MergeSummary), IntegrityError> {
    ensure_unique_links(&history.products, TableRole::History)?;

    let new_rows: Vec<Product> = correlation
        .rows
        .iter()
        .filter(|row| row.presence == Presence::SnapshotOnly)
        .filter_map(|row| row.snapshot)
        .map(|idx| {
            let source = &snapshot.products[idx];
            Product {
                uid: source.uid.clone(),
                categoria: source.categoria.clone(),
                producto: source.producto.clone(),
                link: source.link.clone(),
                imagen: source.imagen.clone(),
                extras: vec![String::new(); history.extras.len()],
                prices: vec![Price::Unobserved; history.dates.len()],
                marca: String::new(),
            }
        })
        .collect();
    ensure_unique_links(&new_rows, TableRole::Snapshot)?;

    let mut summary = MergeSummary {
        history_rows: history.len(),
        snapshot_rows: snapshot.len(),
        history_only: correlation.count(Presence::HistoryOnly),
        snapshot_only: correlation.count(Presence::SnapshotOnly),
        both: correlation.count(Presence::Both),
        ..MergeSummary::default()
    };

    let Catalog {
        extras,
        dates,
        products,
    } = history;
    let width = dates.len();
    let mut seen_links = HashSet::new();
    let mut merged = Vec::with_capacity(products.len() + new_rows.len());
    let history_len = products.len();
    for (pos, mut product) in products.into_iter().chain(new_rows).enumerate() {
        product.fill_missing_text();
        if !seen_links.insert(product.link.clone()) {
            summary.duplicates_dropped += 1;
            continue;
        }
        product.prices.resize(width, Price::Unobserved);
        if pos >= history_len {
            summary.new_products += 1;
        }
        merged.push(product);
    }

    Ok((
        Catalog {
            extras,
            dates,
            products: merged,
        },
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(uid: &str, producto: &str, link: &str, prices: &[f64]) -> Product {
        Product {
            uid: uid.into(),
            categoria: "telefonos".into(),
            producto: producto.into(),
            link: link.into(),
            imagen: format!("{link}.jpg"),
            prices: prices.iter().map(|&p| Price::Observed(p)).collect(),
            ..Product::default()
        }
    }

    fn history() -> Catalog {
        Catalog {
            dates: vec!["2023-01-01".into()],
            products: vec![
                product("1", "Samsung Galaxy S10", "a", &[500.0]),
                product("3", "Nokia 3310", "c", &[40.0]),
            ],
            ..Catalog::default()
        }
    }

    fn snapshot(rows: Vec<Product>) -> Catalog {
        Catalog {
            dates: vec!["2023-02-01".into()],
            products: rows,
            ..Catalog::default()
        }
    }

    #[test]
    fn correlation_classifies_every_uid() {
        let snap = snapshot(vec![
            product("3", "Nokia 3310", "c", &[35.0]),
            product("2", "iPhone 12", "b", &[900.0]),
        ]);
        let corr = Correlation::build(&history(), &snap).unwrap();

        let order: Vec<_> = corr.rows.iter().map(|r| (r.uid.as_str(), r.presence)).collect();
        assert_eq!(
            order,
            vec![
                ("1", Presence::HistoryOnly),
                ("3", Presence::Both),
                ("2", Presence::SnapshotOnly),
            ]
        );
        assert_eq!(corr.get("3").unwrap().snapshot, Some(0));
        assert_eq!(corr.get("2").unwrap().history, None);
        assert!(corr.get("9").is_none());
    }

    #[test]
    fn duplicate_uid_is_rejected() {
        let snap = snapshot(vec![
            product("2", "iPhone 12", "b", &[900.0]),
            product("2", "iPhone 12 Pro", "d", &[1100.0]),
        ]);
        assert_eq!(
            Correlation::build(&history(), &snap).unwrap_err(),
            IntegrityError::DuplicateUid {
                table: TableRole::Snapshot,
                uid: "2".into()
            }
        );
    }

    #[test]
    fn new_products_are_appended_with_sentinel_prices() {
        let hist = history();
        let snap = snapshot(vec![product("2", "iPhone 12", "b", &[900.0])]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        let (merged, summary) = reconcile(hist, &snap, &corr).unwrap();

        assert_eq!(merged.dates, vec!["2023-01-01".to_string()]);
        let uids: Vec<_> = merged.products.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["1", "3", "2"]);
        let added = merged.find("2").unwrap();
        assert_eq!(added.link, "b");
        assert_eq!(added.imagen, "b.jpg");
        assert_eq!(added.prices, vec![Price::Unobserved]);
        assert_eq!(summary.new_products, 1);
        assert_eq!(summary.snapshot_only, 1);
        assert_eq!(summary.history_only, 2);
    }

    #[test]
    fn history_wins_on_link_collision() {
        let hist = history();
        let snap = snapshot(vec![product("7", "Samsung Galaxy S10 (renamed)", "a", &[480.0])]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        let (merged, summary) = reconcile(hist, &snap, &corr).unwrap();

        assert_eq!(merged.len(), 2);
        let kept = merged.products.iter().find(|p| p.link == "a").unwrap();
        assert_eq!(kept.uid, "1");
        assert_eq!(kept.producto, "Samsung Galaxy S10");
        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(summary.new_products, 0);
    }

    #[test]
    fn duplicate_link_within_new_rows_is_an_integrity_error() {
        let hist = history();
        let snap = snapshot(vec![
            product("2", "iPhone 12", "b", &[900.0]),
            product("4", "iPhone 12 64GB", "b", &[910.0]),
        ]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        assert_eq!(
            reconcile(hist, &snap, &corr).unwrap_err(),
            IntegrityError::DuplicateLink {
                table: TableRole::Snapshot,
                link: "b".into()
            }
        );
    }

    #[test]
    fn correlated_view_suffixes_colliding_columns() {
        let hist = history();
        let snap = snapshot(vec![product("2", "iPhone 12", "b", &[900.0])]);
        let headers = Correlation::headers(&hist, &snap);
        assert_eq!(
            headers,
            vec![
                "uid", "categoria_db", "producto_db", "link_db", "imagen_db", "2023-01-01",
                "categoria_t", "producto_t", "link_t", "imagen_t", "2023-02-01", "_merge",
            ]
        );

        let corr = Correlation::build(&hist, &snap).unwrap();
        let last = corr.rows.last().unwrap();
        let cells = corr.cells(last, &hist, &snap);
        assert_eq!(cells.len(), headers.len());
        assert_eq!(cells[1], "");
        assert_eq!(cells[8], "b");
        assert_eq!(cells[10], "900");
        assert_eq!(cells[11], "snapshot_only");
    }

    #[test]
    fn duplicate_link_within_history_is_an_integrity_error() {
        let mut hist = history();
        hist.products.push(product("4", "Nokia 3310 (2017)", "c", &[60.0]));
        let snap = snapshot(vec![]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        assert_eq!(
            reconcile(hist, &snap, &corr).unwrap_err(),
            IntegrityError::DuplicateLink {
                table: TableRole::History,
                link: "c".into()
            }
        );
    }

    #[test]
    fn empty_text_cells_are_filled_with_minus_one() {
        let mut hist = history();
        hist.extras = vec!["vendedor".into()];
        hist.products[0].imagen.clear();
        hist.products[0].extras = vec!["tienda".into()];
        hist.products[1].extras = vec![String::new()];
        let mut new_row = product("2", "iPhone 12", "b", &[900.0]);
        new_row.imagen.clear();
        new_row.categoria.clear();
        let snap = snapshot(vec![new_row]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        let (merged, _) = reconcile(hist, &snap, &corr).unwrap();

        let samsung = merged.find("1").unwrap();
        assert_eq!(samsung.imagen, "-1");
        assert_eq!(samsung.extras, vec!["tienda"]);
        assert_eq!(merged.find("3").unwrap().extras, vec!["-1"]);
        let added = merged.find("2").unwrap();
        assert_eq!(added.imagen, "-1");
        assert_eq!(added.categoria, "-1");
        assert_eq!(added.producto, "iPhone 12");
        assert_eq!(added.extras, vec!["-1"]);
    }

    #[test]
    fn extra_text_columns_show_up_in_the_view() {
        let mut hist = history();
        hist.extras = vec!["vendedor".into()];
        for p in &mut hist.products {
            p.extras = vec!["tienda".into()];
        }
        let snap = snapshot(vec![product("2", "iPhone 12", "b", &[900.0])]);
        let corr = Correlation::build(&hist, &snap).unwrap();
        let view = corr.view(&hist, &snap);

        assert_eq!(view.headers[5], "vendedor");
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[0][5], "tienda");
        assert_eq!(view.rows[2][5], "");
        assert!(view.rows.iter().all(|r| r.len() == view.headers.len()));
    }
}
