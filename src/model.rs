// Core structs: Product, Catalog, Price, Presence
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Descriptive columns every input table must carry besides `uid`.
pub const DESCRIPTIVE_COLUMNS: [&str; 4] = ["categoria", "producto", "link", "imagen"];
pub const UID_COLUMN: &str = "uid";
pub const BRAND_COLUMN: &str = "marca";
/// Written into text cells that have no value.
pub const MISSING_TEXT: &str = "-1";

/// A single price observation. `Unobserved` is stored on disk as `-1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Observed(f64),
    Unobserved,
}

impl Price {
    pub fn is_observed(&self) -> bool {
        matches!(self, Price::Observed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub uid: String,
    pub categoria: String,
    pub producto: String,
    pub link: String,
    pub imagen: String,
    /// One entry per `Catalog::extras`, same order.
    pub extras: Vec<String>,
    /// One entry per `Catalog::dates`, same order.
    pub prices: Vec<Price>,
    pub marca: String,
}

impl Product {
    /// Values for `DESCRIPTIVE_COLUMNS`, same order.
    pub fn descriptive(&self) -> [&str; 4] {
        [&self.categoria, &self.producto, &self.link, &self.imagen]
    }

    /// Replaces every empty text cell, descriptive or extra, with `-1`.
    pub fn fill_missing_text(&mut self) {
        let cells = [
            &mut self.categoria,
            &mut self.producto,
            &mut self.link,
            &mut self.imagen,
        ]
        .into_iter()
        .chain(self.extras.iter_mut());
        for cell in cells {
            if cell.is_empty() {
                *cell = MISSING_TEXT.to_string();
            }
        }
    }
}

/// A table of products keyed by `uid`, with one price column per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Text columns the merge carries through untouched.
    pub extras: Vec<String>,
    pub dates: Vec<String>,
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn date_index(&self, date: &str) -> Option<usize> {
        self.dates.iter().position(|d| d == date)
    }

    pub fn find(&self, uid: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.uid == uid)
    }
}

/// Which input table a row or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    History,
    Snapshot,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::History => write!(f, "history"),
            TableRole::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Outcome of the outer correlation on `uid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    HistoryOnly,
    SnapshotOnly,
    Both,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::HistoryOnly => write!(f, "history_only"),
            Presence::SnapshotOnly => write!(f, "snapshot_only"),
            Presence::Both => write!(f, "both"),
        }
    }
}

/// Counters collected while reconciling one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub history_rows: usize,
    pub snapshot_rows: usize,
    pub history_only: usize,
    pub snapshot_only: usize,
    pub both: usize,
    pub new_products: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing key column 'uid'")]
    MissingKeyColumn,
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}', uid '{uid}': cannot parse price '{value}'")]
    InvalidPrice {
        column: String,
        uid: String,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum IntegrityError {
    #[error("{table} table: duplicate uid '{uid}'")]
    DuplicateUid { table: TableRole, uid: String },
    #[error("{table} rows: duplicate link '{link}'")]
    DuplicateLink { table: TableRole, link: String },
    #[error("snapshot has no price column '{0}'")]
    MissingPriceColumn(String),
    #[error("history already has a price column '{0}'")]
    DateAlreadyRecorded(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategoryError(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read brand config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid brand config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("category '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
