use super::source::LineSource;
use super::types::CsvFileError;
use crate::types::DELIMITER;
use std::path::Path;

/// Eagerly loaded file: header names plus every data line as an owned string.
///
/// This is the allocate-everything baseline; [`LazyCsvLine`](crate::LazyCsvLine)
/// records are built on demand from these lines when needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCollection {
    pub headers: Vec<String>,
    pub lines: Vec<String>,
}

impl LineCollection {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, CsvFileError> {
        let path = path.as_ref();
        let mut source = LineSource::open(path, false)?;
        let mut collection = LineCollection::default();

        match source.next_line()? {
            Some(header_line) => collection
                .headers
                .extend(header_line.split(DELIMITER as char).map(str::to_owned)),
            None => return Ok(collection),
        }
        while let Some(line) = source.next_line()? {
            collection.lines.push(line.to_owned());
        }

        tracing::debug!(path = %path.display(), lines = collection.lines.len(), "loaded line collection");
        Ok(collection)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
