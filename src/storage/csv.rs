use crate::analyzer::CorrelationView;
use crate::model::{
    Catalog, LoadError, Product, SinkError, BRAND_COLUMN, DESCRIPTIVE_COLUMNS, UID_COLUMN,
};
use crate::utils::{format_price, is_iso_date, normalize_uid, parse_price};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Loads a table keyed by `uid`.
pub trait TableLoader {
    fn load(&self, path: &Path) -> Result<Catalog, LoadError>;
}

/// Persists the merged table.
pub trait Sink {
    fn write(&self, catalog: &Catalog, path: &Path) -> Result<(), SinkError>;
}

pub struct CsvStorage;

impl CsvStorage {
    pub fn new() -> Self {
        Self
    }

    /// Writes the correlated view (suffixed columns plus `_merge`) for debugging.
    pub fn dump_correlation(&self, view: &CorrelationView, path: &Path) -> Result<(), SinkError> {
        let file = create_file(path)?;
        write_correlation(file, view)
    }
}

impl Default for CsvStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TableLoader for CsvStorage {
    fn load(&self, path: &Path) -> Result<Catalog, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_catalog(file)
    }
}

impl Sink for CsvStorage {
    fn write(&self, catalog: &Catalog, path: &Path) -> Result<(), SinkError> {
        let file = create_file(path)?;
        write_catalog(file, catalog)
    }
}

/// `<out_dir>/<category>_db.csv`
pub fn output_path(out_dir: &Path, category: &str) -> PathBuf {
    out_dir.join(format!("{}_db.csv", category))
}

fn create_file(path: &Path) -> Result<File, SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    File::create(path).map_err(io_err)
}

/// Column positions resolved from the header row and the cells below it.
struct Layout {
    uid: usize,
    descriptive: [usize; 4],
    marca: Option<usize>,
    extras: Vec<(usize, String)>,
    prices: Vec<(usize, String)>,
}

impl Layout {
    /// Columns named like a date are always prices. Any other unknown column
    /// is a price column when every cell parses as one, text otherwise.
    fn resolve(headers: &StringRecord, records: &[StringRecord]) -> Result<Self, LoadError> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let uid = position(UID_COLUMN).ok_or(LoadError::MissingKeyColumn)?;
        let mut descriptive = [0; 4];
        for (slot, name) in descriptive.iter_mut().zip(DESCRIPTIVE_COLUMNS) {
            *slot = position(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
        }
        let marca = position(BRAND_COLUMN);

        let mut extras = Vec::new();
        let mut prices = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if header == UID_COLUMN || header == BRAND_COLUMN || DESCRIPTIVE_COLUMNS.contains(&header) {
                continue;
            }
            let numeric = || {
                records
                    .iter()
                    .all(|r| parse_price(r.get(idx).unwrap_or("")).is_some())
            };
            if is_iso_date(header) || numeric() {
                prices.push((idx, header.to_string()));
            } else {
                extras.push((idx, header.to_string()));
            }
        }

        Ok(Self {
            uid,
            descriptive,
            marca,
            extras,
            prices,
        })
    }

    fn product(&self, record: &StringRecord) -> Result<Product, LoadError> {
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let uid = normalize_uid(record.get(self.uid).unwrap_or(""));

        let mut prices = Vec::with_capacity(self.prices.len());
        for (idx, column) in &self.prices {
            let raw = record.get(*idx).unwrap_or("");
            let price = parse_price(raw).ok_or_else(|| LoadError::InvalidPrice {
                column: column.clone(),
                uid: uid.clone(),
                value: raw.to_string(),
            })?;
            prices.push(price);
        }

        let [categoria, producto, link, imagen] = self.descriptive.map(cell);
        Ok(Product {
            uid,
            categoria,
            producto,
            link,
            imagen,
            extras: self.extras.iter().map(|(idx, _)| cell(*idx)).collect(),
            prices,
            marca: self.marca.map(cell).unwrap_or_default(),
        })
    }
}

pub fn read_catalog<R: Read>(reader: R) -> Result<Catalog, LoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    let layout = Layout::resolve(&headers, &records)?;

    let mut products = Vec::with_capacity(records.len());
    for record in &records {
        products.push(layout.product(record)?);
    }

    Ok(Catalog {
        extras: layout.extras.into_iter().map(|(_, name)| name).collect(),
        dates: layout.prices.into_iter().map(|(_, name)| name).collect(),
        products,
    })
}

pub fn write_catalog<W: Write>(writer: W, catalog: &Catalog) -> Result<(), SinkError> {
    let mut writer = Writer::from_writer(writer);

    let mut header = vec![UID_COLUMN];
    header.extend(DESCRIPTIVE_COLUMNS);
    header.extend(catalog.extras.iter().map(String::as_str));
    header.extend(catalog.dates.iter().map(String::as_str));
    header.push(BRAND_COLUMN);
    writer.write_record(&header)?;

    for product in &catalog.products {
        let mut row = vec![product.uid.clone()];
        row.extend(product.descriptive().map(str::to_string));
        row.extend(product.extras.iter().cloned());
        row.extend(product.prices.iter().map(|&p| format_price(p)));
        row.push(product.marca.clone());
        writer.write_record(&row)?;
    }

    writer.flush().map_err(|e| SinkError::Csv(e.into()))?;
    Ok(())
}

pub fn write_correlation<W: Write>(writer: W, view: &CorrelationView) -> Result<(), SinkError> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(&view.headers)?;
    for row in &view.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| SinkError::Csv(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Price;

    const HISTORY: &str = "\
uid,categoria,producto,link,imagen,2023-01-01,marca
1,telefonos,Samsung Galaxy S10,a,a.jpg,500.0,Samsung
3,telefonos,Nokia 3310,c,,-1,Nokia
";

    #[test]
    fn reads_key_descriptive_and_price_columns() {
        let catalog = read_catalog(HISTORY.as_bytes()).unwrap();
        assert_eq!(catalog.dates, vec!["2023-01-01"]);
        assert_eq!(catalog.len(), 2);

        let first = &catalog.products[0];
        assert_eq!(first.uid, "1");
        assert_eq!(first.producto, "Samsung Galaxy S10");
        assert_eq!(first.prices, vec![Price::Observed(500.0)]);
        assert_eq!(first.marca, "Samsung");
        assert_eq!(catalog.products[1].prices, vec![Price::Unobserved]);
        assert_eq!(catalog.products[1].imagen, "");
    }

    #[test]
    fn missing_uid_column_is_a_load_error() {
        let err = read_catalog("categoria,producto,link,imagen\nx,y,z,w\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingKeyColumn));
    }

    #[test]
    fn missing_descriptive_column_is_a_load_error() {
        let err = read_catalog("uid,categoria,producto,imagen\n1,x,y,w\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "link"));
    }

    #[test]
    fn non_numeric_price_names_the_cell() {
        let data = "uid,categoria,producto,link,imagen,2023-02-01\n7,audio,JBL Go,j,,gratis\n";
        match read_catalog(data.as_bytes()).unwrap_err() {
            LoadError::InvalidPrice { column, uid, value } => {
                assert_eq!(column, "2023-02-01");
                assert_eq!(uid, "7");
                assert_eq!(value, "gratis");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn writes_marca_last_and_sentinel_prices() {
        let mut catalog = read_catalog(HISTORY.as_bytes()).unwrap();
        catalog.dates.push("2023-02-01".into());
        for product in &mut catalog.products {
            product.prices.push(Price::Unobserved);
        }

        let mut out = Vec::new();
        write_catalog(&mut out, &catalog).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "uid,categoria,producto,link,imagen,2023-01-01,2023-02-01,marca");
        assert_eq!(lines[1], "1,telefonos,Samsung Galaxy S10,a,a.jpg,500,-1,Samsung");
        assert_eq!(lines[2], "3,telefonos,Nokia 3310,c,,-1,-1,Nokia");
    }

    #[test]
    fn storage_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvStorage::new();
        let catalog = read_catalog(HISTORY.as_bytes()).unwrap();

        let path = output_path(&dir.path().join("out"), "telefonos");
        assert!(path.ends_with("out/telefonos_db.csv"));
        storage.write(&catalog, &path).unwrap();
        assert_eq!(storage.load(&path).unwrap(), catalog);
    }

    #[test]
    fn loading_a_missing_file_reports_the_path() {
        let err = CsvStorage::new().load(Path::new("/nonexistent/history.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/history.csv"));
    }

    #[test]
    fn text_columns_pass_through() {
        let data = "\
uid,categoria,producto,link,imagen,vendedor,rating,2023-01-01
1,audio,JBL Go,j,j.jpg,Tienda Uno,4.5,120
2,audio,Bose QC35,q,q.jpg,,,300
";
        let catalog = read_catalog(data.as_bytes()).unwrap();
        assert_eq!(catalog.extras, vec!["vendedor"]);
        assert_eq!(catalog.dates, vec!["rating", "2023-01-01"]);
        assert_eq!(catalog.products[0].extras, vec!["Tienda Uno"]);
        assert_eq!(catalog.products[1].extras, vec![""]);

        let mut out = Vec::new();
        write_catalog(&mut out, &catalog).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("uid,categoria,producto,link,imagen,vendedor,rating,2023-01-01,marca")
        );
    }

    #[test]
    fn uids_are_trimmed_and_integers_canonical() {
        let data = "uid,categoria,producto,link,imagen\n 01 ,audio,JBL Go,j,\nMCO-9,audio,Bose,q,\n";
        let catalog = read_catalog(data.as_bytes()).unwrap();
        let uids: Vec<_> = catalog.products.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["1", "MCO-9"]);
    }
}
