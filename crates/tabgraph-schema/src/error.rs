//! Error taxonomy shared by every stage of the load pipeline.
//!
//! All of these are caller-input errors: they are raised synchronously while a
//! dataset is being parsed or constructed and abort the whole pipeline. None
//! of them is retried.

use std::path::{Path, PathBuf};

/// Which manifest section a duplicated type label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Node,
    Edge,
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Node => f.write_str("node"),
            TypeKind::Edge => f.write_str("edge"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Manifest is structurally invalid or declares an unsupported version.
    #[error("schema error: {0}")]
    Schema(String),

    /// The same node type label or edge type triple is declared twice.
    #[error("duplicate {kind} type {label} in manifest")]
    DuplicateType { kind: TypeKind, label: String },

    /// A required identifier column is absent from a table.
    #[error("missing required column `{column}` in {table}")]
    MissingColumn { table: String, column: String },

    /// A column's cells cannot be coerced under the active parser's rules.
    #[error("cannot parse column `{column}`: {message}")]
    Parse { column: String, message: String },

    /// An identifier refers to a node or graph absent from the complementary table.
    #[error("reference error: {0}")]
    Reference(String),

    /// Identifier, graph id and feature sequences disagree in length.
    #[error("shape mismatch for {context}: expected {expected} rows, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Split ratios or split targets are unusable.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(column: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Parse {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        DataError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
