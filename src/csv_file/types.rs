use crate::error::LineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options applied to every line read from a [`LazyCsvFile`](super::LazyCsvFile).
///
/// Deserializable from JSON; missing keys fall back to the defaults below.
///
/// ```json
/// { "force_decompression": false, "line_slack": 16, "prevent_reallocation": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// Decompress the input as gzip whether or not the magic bytes are present.
    pub force_decompression: bool,
    /// Slack handed to every line. `None` lets each line reserve 10% of its own length.
    pub line_slack: Option<usize>,
    /// Fail writes that outgrow the slack instead of reallocating the line.
    pub prevent_reallocation: bool,
}

impl FileOptions {
    pub fn from_json_str(json: &str) -> Result<Self, CsvFileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CsvFileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_force_decompression(mut self, force: bool) -> Self {
        self.force_decompression = force;
        self
    }

    pub fn with_line_slack(mut self, slack: usize) -> Self {
        self.line_slack = Some(slack);
        self
    }

    pub fn with_prevent_reallocation(mut self, prevent: bool) -> Self {
        self.prevent_reallocation = prevent;
        self
    }
}

#[derive(Debug, Error)]
pub enum CsvFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Line(#[from] LineError),
    /// A data line could not be turned into a record. `line` is 1-based and
    /// counts the header line.
    #[error("line {line}: {source}")]
    AtLine { line: u64, source: LineError },
    #[error("{} has no header line", .0.display())]
    MissingHeader(PathBuf),
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}
