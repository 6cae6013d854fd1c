use std::path::PathBuf;

use serde::Serialize;

/// Why a single source row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// A field is present but does not parse (non-numeric, out of range, inverted years).
    #[error("malformed {field}: {value:?}")]
    MalformedRow { field: &'static str, value: String },
    /// A required field is empty.
    #[error("missing {field}")]
    MissingField { field: &'static str },
    /// The row could not be decoded at all (bad UTF-8, wrong field count).
    #[error("unreadable row: {reason}")]
    Unreadable { reason: String },
}

/// A rejected row and the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct RowError {
    pub line: u64,
    #[serde(flatten)]
    pub kind: ErrorKind,
}

impl RowError {
    pub fn new(line: u64, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Failures that prevent a recordings table from loading at all.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv read failed: {0}")]
    Csv(#[from] csv::Error),
}
