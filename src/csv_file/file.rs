use super::source::LineSource;
use super::types::{CsvFileError, FileOptions};
use crate::lazy_line::LazyCsvLine;
use crate::types::HeaderMap;
use std::path::{Path, PathBuf};

/// Reads a comma-delimited file, optionally gzip-compressed, as [`LazyCsvLine`]s.
///
/// The header line is parsed once on open. Every line handed out borrows
/// that single [`HeaderMap`] and receives the slack and reallocation policy
/// from [`FileOptions`].
pub struct LazyCsvFile {
    path: PathBuf,
    options: FileOptions,
    headers: HeaderMap,
    source: Option<LineSource>,
}

impl LazyCsvFile {
    pub fn open(path: impl AsRef<Path>, options: FileOptions) -> Result<Self, CsvFileError> {
        let path = path.as_ref().to_path_buf();

        let mut source = LineSource::open(&path, options.force_decompression)?;
        let headers = match source.next_line()? {
            Some(header_line) => HeaderMap::from_line(header_line)?,
            None => return Err(CsvFileError::MissingHeader(path)),
        };
        tracing::debug!(path = %path.display(), columns = headers.len(), "read csv headers");

        Ok(Self {
            path,
            options,
            headers,
            source: None,
        })
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    /// `true` once every data line has been read.
    pub fn is_at_end(&mut self) -> Result<bool, CsvFileError> {
        data_source(&mut self.source, &self.path, &self.options)?.is_at_end()
    }

    /// Read the next data line, or `None` at the end of the file.
    ///
    /// The returned line borrows the file; drop it before reading the next
    /// one, or use [`cursor`](Self::cursor) for lines that must outlive it.
    pub fn read_line(&mut self) -> Result<Option<LazyCsvLine<'_>>, CsvFileError> {
        data_source(&mut self.source, &self.path, &self.options)?
            .next_record(&self.headers, &self.options)
    }

    /// Rewind to the first data line.
    pub fn reset_position(&mut self) -> Result<(), CsvFileError> {
        tracing::debug!(path = %self.path.display(), "resetting csv position");
        self.source = Some(LineSource::open_data(&self.path, &self.options)?);
        Ok(())
    }

    /// A fresh forward cursor over the data lines, independent of
    /// [`read_line`](Self::read_line) and of any other cursor.
    pub fn cursor(&self) -> Result<LineCursor<'_>, CsvFileError> {
        Ok(LineCursor {
            headers: &self.headers,
            options: &self.options,
            source: LineSource::open_data(&self.path, &self.options)?,
        })
    }

    /// Read every data line into memory.
    pub fn read_all_lines(&self) -> Result<Vec<LazyCsvLine<'_>>, CsvFileError> {
        let lines = self.cursor()?.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(path = %self.path.display(), lines = lines.len(), "read all csv lines");
        Ok(lines)
    }
}

/// The open data stream, opened past the header on first use.
fn data_source<'a>(
    slot: &'a mut Option<LineSource>,
    path: &Path,
    options: &FileOptions,
) -> Result<&'a mut LineSource, CsvFileError> {
    let source = match slot.take() {
        Some(source) => source,
        None => LineSource::open_data(path, options)?,
    };
    Ok(slot.insert(source))
}

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// Forward-only iterator over the data lines of a [`LazyCsvFile`].
pub struct LineCursor<'h> {
    headers: &'h HeaderMap,
    options: &'h FileOptions,
    source: LineSource,
}

impl<'h> LineCursor<'h> {
    #[inline]
    pub fn headers(&self) -> &'h HeaderMap {
        self.headers
    }

    pub fn read_line(&mut self) -> Result<Option<LazyCsvLine<'h>>, CsvFileError> {
        self.source.next_record(self.headers, self.options)
    }

    pub fn is_at_end(&mut self) -> Result<bool, CsvFileError> {
        self.source.is_at_end()
    }
}

impl<'h> Iterator for LineCursor<'h> {
    type Item = Result<LazyCsvLine<'h>, CsvFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
