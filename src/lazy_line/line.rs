use crate::error::LineError;
use crate::types::*;
use std::fmt;

// ─── LazyCsvLine ────────────────────────────────────────────────────────────

/// A lazily parsed line of delimited text that supports in-place field updates.
///
/// The line keeps its text in one contiguous buffer followed by `slack` bytes
/// of reserved room, plus one [`Offset`] per column. Nothing is split or
/// allocated per field: reads slice the buffer, and writes shift the tail of
/// the line inside the buffer, consuming or releasing slack.
///
/// ```text
///  ┌──────────────────────────────┬──────────────┐
///  │ f0 , f1 , ... , fn-1         │ slack        │
///  └──────────────────────────────┴──────────────┘
///  0                         used_len        buf.len()
/// ```
///
/// The header map is borrowed, so every line of a file shares one copy.
#[derive(Clone)]
pub struct LazyCsvLine<'h> {
    pub(crate) buf: Vec<u8>,
    pub(crate) offsets: Vec<Offset>,
    pub(crate) headers: &'h HeaderMap,
    pub(crate) slack: usize,
    pub(crate) initial_slack: usize,
    pub(crate) prevent_reallocation: bool,
}

impl<'h> LazyCsvLine<'h> {
    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    /// Build a line from raw text.
    ///
    /// `slack` defaults to 10% of the text length, rounded up. With
    /// `prevent_reallocation` set, a write that needs more than the remaining
    /// slack fails instead of growing the buffer.
    ///
    /// Fails with [`LineError::MalformedLine`] when the number of fields found
    /// differs from the number of columns in `headers`.
    pub fn new(
        text: &str,
        headers: &'h HeaderMap,
        slack: Option<usize>,
        prevent_reallocation: bool,
    ) -> Result<Self, LineError> {
        let slack = slack.unwrap_or_else(|| text.len().div_ceil(DEFAULT_SLACK_DIVISOR));
        let offsets = compute_offsets(text.as_bytes(), headers.len())?;

        let mut buf = Vec::with_capacity(text.len() + slack);
        buf.extend_from_slice(text.as_bytes());
        buf.resize(text.len() + slack, 0);

        Ok(Self {
            buf,
            offsets,
            headers,
            slack,
            initial_slack: slack,
            prevent_reallocation,
        })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn headers(&self) -> &'h HeaderMap {
        self.headers
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.offsets.len()
    }

    /// Positional offsets of every column within the line.
    #[inline]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Reserved room currently left at the end of the buffer.
    #[inline]
    pub fn slack(&self) -> usize {
        self.slack
    }

    /// Slack granted at construction, and granted again on every reallocation.
    #[inline]
    pub fn initial_slack(&self) -> usize {
        self.initial_slack
    }

    #[inline]
    pub fn prevent_reallocation(&self) -> bool {
        self.prevent_reallocation
    }

    /// Length of the meaningful part of the buffer (fields plus separators).
    #[inline]
    pub fn used_len(&self) -> usize {
        self.buf.len() - self.slack
    }

    // ════════════════════════════════════════════════════════════════════════
    // Serialization
    // ════════════════════════════════════════════════════════════════════════

    /// The line text as currently stored, without slack.
    #[inline]
    pub fn as_str(&self) -> &str {
        field_str(&self.buf, Offset::new(0, self.used_len()))
    }
}

impl fmt::Display for LazyCsvLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for LazyCsvLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCsvLine")
            .field("text", &self.as_str())
            .field("offsets", &self.offsets)
            .field("slack", &self.slack)
            .field("initial_slack", &self.initial_slack)
            .field("prevent_reallocation", &self.prevent_reallocation)
            .finish()
    }
}

// ─── Offset scan ────────────────────────────────────────────────────────────

/// Single pass over the line. An unquoted delimiter closes a field; either
/// quote marker flips the quoted state, without pairing or escapes. The last
/// field runs to the end of the text, so a trailing delimiter yields an
/// empty final field.
pub(crate) fn compute_offsets(text: &[u8], field_count: usize) -> Result<Vec<Offset>, LineError> {
    let mut offsets = Vec::with_capacity(field_count);
    let mut quoted = false;
    let mut start = 0;

    for (i, &byte) in text.iter().enumerate() {
        match byte {
            DELIMITER if !quoted => {
                offsets.push(Offset::new(start, i - start));
                start = i + 1;
            }
            SINGLE_QUOTE | DOUBLE_QUOTE => quoted = !quoted,
            _ => {}
        }
    }
    offsets.push(Offset::new(start, text.len() - start));

    if offsets.len() != field_count {
        return Err(LineError::MalformedLine {
            expected: field_count,
            found: offsets.len(),
        });
    }
    Ok(offsets)
}
