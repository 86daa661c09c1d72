pub mod csv;

pub use self::csv::{output_path, CsvStorage, Sink, TableLoader};
