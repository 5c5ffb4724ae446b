use super::line::LazyCsvLine;
use crate::error::LineError;

impl<'h> LazyCsvLine<'h> {
    // ════════════════════════════════════════════════════════════════════════
    // Internal: buffer management
    // ════════════════════════════════════════════════════════════════════════

    /// Move the used region into a fresh buffer with room for `growth` more
    /// bytes plus a new round of `initial_slack`. The old slack is not copied.
    fn reallocate(&mut self, growth: usize) {
        let used = self.used_len();
        let new_len = used + growth + self.initial_slack;
        tracing::trace!(used, growth, new_len, "reallocating line buffer");

        let mut buf = vec![0u8; new_len];
        buf[..used].copy_from_slice(&self.buf[..used]);
        self.buf = buf;
        self.slack = growth + self.initial_slack;
    }

    /// Recompute the start of every field after `index` from the field before it.
    fn fixup_offsets_after(&mut self, index: usize) {
        let mut start = self.offsets[index].end() + 1;
        for offset in &mut self.offsets[index + 1..] {
            offset.start = start;
            start += offset.len + 1;
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Field setters
    // ════════════════════════════════════════════════════════════════════════

    /// Replace the field at `index` with `value`.
    ///
    /// Same-length values are overwritten in place. Otherwise the rest of the
    /// line is shifted inside the buffer and the difference is taken from (or
    /// returned to) the slack. When the slack runs out the buffer is
    /// reallocated with `initial_slack` fresh room, unless reallocation is
    /// prevented, in which case [`LineError::CapacityExceeded`] is returned and
    /// the line is left as it was.
    pub fn set(&mut self, index: usize, value: &str) -> Result<(), LineError> {
        let offset = self.offset_at(index)?;
        let new_bytes = value.as_bytes();
        let new_len = new_bytes.len();

        if new_len == offset.len {
            // Fast path: same length, direct overwrite
            self.buf[offset.start..offset.end()].copy_from_slice(new_bytes);
            return Ok(());
        }

        if new_len > offset.len {
            let growth = new_len - offset.len;
            if growth > self.slack {
                if self.prevent_reallocation {
                    return Err(LineError::CapacityExceeded {
                        required: growth,
                        available: self.slack,
                    });
                }
                self.reallocate(growth);
            }

            let used = self.used_len();
            // Shift tail right
            self.buf.copy_within(offset.end()..used, offset.end() + growth);
            self.slack -= growth;
        } else {
            let shrink = offset.len - new_len;
            let used = self.used_len();
            // Shift tail left
            self.buf.copy_within(offset.end()..used, offset.end() - shrink);
            self.slack += shrink;
        }

        self.buf[offset.start..offset.start + new_len].copy_from_slice(new_bytes);
        self.offsets[index].len = new_len;
        self.fixup_offsets_after(index);
        Ok(())
    }

    /// Replace the field for column `name` with `value`. See [`set`](Self::set).
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<(), LineError> {
        let index = self.headers.index_of(name)?;
        self.set(index, value)
    }
}
