pub mod csv_file;
pub mod error;
pub mod lazy_line;
pub mod types;

pub use csv_file::{CsvFileError, FileOptions, LazyCsvFile, LineCollection, LineCursor};
pub use error::LineError;
pub use lazy_line::LazyCsvLine;
pub use types::{FastMap, FieldIter, HeaderMap, Offset};
