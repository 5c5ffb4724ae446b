// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("Column not found: {0}")]
    ColumnNotFound(SmolStr),
    #[error("Column index {index} out of range for {len} columns")]
    IndexOutOfRange { index: usize, len: usize },
    /// Growing the field needs more room than the remaining slack and the
    /// line was built with reallocation disabled. The line is left untouched.
    #[error(
        "Number of bytes to be added ({required}) exceeds available slack ({available}) and reallocation is prevented"
    )]
    CapacityExceeded { required: usize, available: usize },
    #[error("Malformed line: expected {expected} fields, found {found}")]
    MalformedLine { expected: usize, found: usize },
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(SmolStr),
}
