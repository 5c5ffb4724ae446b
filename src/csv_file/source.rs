use super::types::{CsvFileError, FileOptions};
use crate::lazy_line::LazyCsvLine;
use crate::types::{BYTE_ORDER_MARK, GZIP_MAGIC, HeaderMap};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Forward-only line reader over a plain or gzip-compressed file.
pub(crate) struct LineSource {
    reader: Box<dyn BufRead + Send>,
    raw: Vec<u8>,
    /// Lines handed out so far, header included.
    lines_read: u64,
}

impl LineSource {
    pub(crate) fn open(path: &Path, force_decompression: bool) -> Result<Self, CsvFileError> {
        let mut file = File::open(path)?;
        let gzipped = force_decompression || is_gzipped(&mut file)?;

        let reader: Box<dyn BufRead + Send> = if gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        tracing::debug!(
            path = %path.display(),
            gzipped,
            forced = force_decompression,
            "opened csv source"
        );

        Ok(Self {
            reader,
            raw: Vec::new(),
            lines_read: 0,
        })
    }

    /// Open the file and step over its header line.
    pub(crate) fn open_data(path: &Path, options: &FileOptions) -> Result<Self, CsvFileError> {
        let mut source = Self::open(path, options.force_decompression)?;
        source.next_line()?;
        Ok(source)
    }

    /// Next line without its line terminator, or `None` at end of input.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. A UTF-8 byte order mark
    /// in front of the first line is dropped.
    pub(crate) fn next_line(&mut self) -> Result<Option<&str>, CsvFileError> {
        if self.read_raw_line()? == 0 {
            tracing::trace!(lines = self.lines_read, "end of csv input");
            return Ok(None);
        }
        self.lines_read += 1;

        let text = std::str::from_utf8(&self.raw)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if self.lines_read == 1 {
            return Ok(Some(text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text)));
        }
        Ok(Some(text))
    }

    /// Fill `raw` with the next line, terminator excluded. Returns the number
    /// of bytes consumed from the reader, terminator included.
    fn read_raw_line(&mut self) -> io::Result<usize> {
        self.raw.clear();
        let mut consumed = 0;
        loop {
            let (terminator, used) = {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    return Ok(consumed);
                }
                match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                    Some(i) => {
                        self.raw.extend_from_slice(&available[..i]);
                        (Some(available[i]), i + 1)
                    }
                    None => {
                        self.raw.extend_from_slice(available);
                        (None, available.len())
                    }
                }
            };
            self.reader.consume(used);
            consumed += used;

            match terminator {
                Some(b'\r') => {
                    if self.reader.fill_buf()?.first() == Some(&b'\n') {
                        self.reader.consume(1);
                        consumed += 1;
                    }
                    return Ok(consumed);
                }
                Some(_) => return Ok(consumed),
                None => {}
            }
        }
    }

    /// Read the next line as a record sharing `headers`.
    pub(crate) fn next_record<'h>(
        &mut self,
        headers: &'h HeaderMap,
        options: &FileOptions,
    ) -> Result<Option<LazyCsvLine<'h>>, CsvFileError> {
        let Some(text) = self.next_line()? else {
            return Ok(None);
        };
        let line = LazyCsvLine::new(
            text,
            headers,
            options.line_slack,
            options.prevent_reallocation,
        )
        .map_err(|source| CsvFileError::AtLine {
            line: self.lines_read,
            source,
        })?;
        Ok(Some(line))
    }

    pub(crate) fn is_at_end(&mut self) -> Result<bool, CsvFileError> {
        Ok(self.reader.fill_buf()?.is_empty())
    }
}

/// Peek at the first two bytes and rewind.
fn is_gzipped(file: &mut File) -> io::Result<bool> {
    let mut magic = Vec::with_capacity(GZIP_MAGIC.len());
    file.by_ref()
        .take(GZIP_MAGIC.len() as u64)
        .read_to_end(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(magic == GZIP_MAGIC)
}
