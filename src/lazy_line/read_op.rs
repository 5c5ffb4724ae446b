use super::line::LazyCsvLine;
use crate::error::LineError;
use crate::types::*;

impl<'h> LazyCsvLine<'h> {
    #[inline]
    pub(crate) fn offset_at(&self, index: usize) -> Result<Offset, LineError> {
        self.offsets
            .get(index)
            .copied()
            .ok_or(LineError::IndexOutOfRange {
                index,
                len: self.offsets.len(),
            })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Read access (zero-copy)
    // ════════════════════════════════════════════════════════════════════════

    /// Borrow the field at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&str, LineError> {
        let offset = self.offset_at(index)?;
        Ok(field_str(&self.buf, offset))
    }

    /// Borrow the field for column `name`.
    #[inline]
    pub fn get_by_name(&self, name: &str) -> Result<&str, LineError> {
        self.get(self.headers.index_of(name)?)
    }

    /// Iterate over all fields in column order.
    #[inline]
    pub fn iter_fields(&self) -> FieldIter<'_> {
        FieldIter {
            buf: &self.buf,
            offsets: self.offsets.iter(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Read access (owned copies)
    // ════════════════════════════════════════════════════════════════════════

    /// Copy the field at `index` out of the line.
    pub fn read(&self, index: usize) -> Result<String, LineError> {
        self.get(index).map(str::to_owned)
    }

    /// Copy the field for column `name` out of the line.
    pub fn read_by_name(&self, name: &str) -> Result<String, LineError> {
        self.get_by_name(name).map(str::to_owned)
    }
}
