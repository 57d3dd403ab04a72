use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every importer.
pub type ImportResult<T> = Result<T, ImportError>;

/// Error type for dive log imports.
///
/// Only the structural variants (`SourceUnavailable`, `Unreadable`, `Query`,
/// `MalformedDocument`, `Config`) ever abort an import. `FieldUnparsable` and
/// `DanglingReference` describe per-field and per-row degradations; importers
/// build them for the debug log and carry on without the affected data.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("cannot open dive store {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("unparsable {field}: '{value}'")]
    FieldUnparsable { field: String, value: String },

    #[error("{table} references unknown key {key}")]
    DanglingReference { table: &'static str, key: i64 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ImportError {
    pub fn unparsable(field: impl Into<String>, value: impl Into<String>) -> Self {
        ImportError::FieldUnparsable {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn dangling(table: &'static str, key: i64) -> Self {
        ImportError::DanglingReference { table, key }
    }

    /// Whether this error aborts an import rather than degrading one field or row.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ImportError::FieldUnparsable { .. } | ImportError::DanglingReference { .. }
        )
    }
}
