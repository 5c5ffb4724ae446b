pub mod file;
pub mod line_collection;
mod source;
pub mod types;

pub use file::{LazyCsvFile, LineCursor};
pub use line_collection::LineCollection;
pub use types::{CsvFileError, FileOptions};

#[cfg(test)]
mod tests;
