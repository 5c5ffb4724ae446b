use crate::error::LineError;
use rustc_hash::FxHasher;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

pub type FastMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

// ─── Scanner Bytes ──────────────────────────────────────────────────────────
pub const DELIMITER: u8 = b',';
pub const SINGLE_QUOTE: u8 = b'\'';
pub const DOUBLE_QUOTE: u8 = b'"';

/// Dropped from the front of a file's first line.
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Default slack is this fraction (1/n) of the raw line length, rounded up.
pub const DEFAULT_SLACK_DIVISOR: usize = 10;

// ─── Offset ─────────────────────────────────────────────────────────────────

/// Location of one field inside a line buffer: the byte range `[start, start + len)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub start: usize,
    pub len: usize,
}

impl Offset {
    #[inline]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last byte of the field.
    #[inline]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// View a field as `&str`.
///
/// Line buffers are only ever filled from `&str` input, and field
/// boundaries always sit next to the ASCII delimiter, so every field
/// range lies on char boundaries.
#[inline]
pub(crate) fn field_str(buf: &[u8], offset: Offset) -> &str {
    let bytes = &buf[offset.start..offset.end()];
    debug_assert!(std::str::from_utf8(bytes).is_ok());
    // SAFETY: `buf[..used_len]` is copied from `&str` values only, and every
    // offset starts at 0, ends at `used_len`, or borders an ASCII delimiter,
    // none of which can split a multi-byte char.
    unsafe { std::str::from_utf8_unchecked(bytes) }
}

// ─── HeaderMap ──────────────────────────────────────────────────────────────

/// Column name → positional index for every line of one file.
///
/// Built once and never mutated afterwards. Lines borrow it, so a single map
/// is shared by all lines of a file without being cloned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    names: Vec<SmolStr>,
    index: FastMap<SmolStr, usize>,
}

impl HeaderMap {
    /// Build a map from column names in positional order.
    pub fn from_names<I, S>(names: I) -> Result<Self, LineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let mut map = HeaderMap::default();
        for name in names {
            let name: SmolStr = name.into();
            if map.index.contains_key(&name) {
                return Err(LineError::DuplicateColumn(name));
            }
            map.index.insert(name.clone(), map.names.len());
            map.names.push(name);
        }
        Ok(map)
    }

    /// Split a header line on the delimiter. Quote markers are not honoured here.
    pub fn from_line(line: &str) -> Result<Self, LineError> {
        Self::from_names(line.split(DELIMITER as char))
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Like [`get`](Self::get) but reports a missing column as an error.
    #[inline]
    pub fn index_of(&self, name: &str) -> Result<usize, LineError> {
        self.get(name)
            .ok_or_else(|| LineError::ColumnNotFound(SmolStr::new(name)))
    }

    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(SmolStr::as_str)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in positional order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.names.iter().map(SmolStr::as_str)
    }
}

// ─── Iterator ───────────────────────────────────────────────────────────────

/// Zero-copy iterator over the fields of a line, in column order.
pub struct FieldIter<'a> {
    pub(crate) buf: &'a [u8],
    pub(crate) offsets: std::slice::Iter<'a, Offset>,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        Some(field_str(self.buf, *offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl<'a> ExactSizeIterator for FieldIter<'a> {}
