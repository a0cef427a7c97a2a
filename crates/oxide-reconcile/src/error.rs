//! Error types for schema reconciliation.

use crate::dialect::Dialect;
use crate::entity::EntityKind;

/// What the engine was trying to do when a dialect had no implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Listing entity names.
    Enumerate,
    /// Reading the canonical creation statement of an entity.
    Reconstruct,
    /// Reading the metadata of a single column.
    Describe,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Enumerate => "listing",
            Self::Reconstruct => "generating CREATE statements for",
            Self::Describe => "describing",
        })
    }
}

/// Errors that can occur while comparing schemas or generating patches.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The dialect has no implementation for this entity kind and operation.
    #[error("{operation} {kind} is not supported for {dialect}")]
    UnsupportedOperation {
        /// Dialect family of the connection.
        dialect: Dialect,
        /// Entity kind requested.
        kind: EntityKind,
        /// Operation requested.
        operation: Operation,
    },

    /// The two connections belong to different dialect families.
    #[error("Comparing a {first} database with a {second} database is not supported")]
    UnsupportedComparison {
        /// Dialect of the reference connection.
        first: Dialect,
        /// Dialect of the comparison connection.
        second: Dialect,
    },

    /// A metadata query failed.
    #[error("Failed to query {kind}: {source}")]
    QueryFailed {
        /// Entity kind the query was issued for.
        kind: EntityKind,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The selected row does not correspond to an entity.
    #[error("No entity at row {row}")]
    InvalidSelection {
        /// Zero-based row index.
        row: usize,
    },

    /// The reference database returned no definition for an entity.
    #[error("No definition found for {kind} '{name}'")]
    DefinitionNotFound {
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
    },

    /// Database error while connecting or pinging.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No saved connection with that name.
    #[error("Connection '{0}' not found")]
    ProfileNotFound(String),

    /// A saved connection with that name already exists.
    #[error("Connection '{0}' already exists")]
    ProfileExists(String),

    /// The platform has no configuration directory.
    #[error("Could not determine the configuration directory")]
    ConfigDirUnavailable,

    /// IO error (reading/writing the profile store).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Returns whether this error means "not implemented" rather than a failure.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperation { .. } | Self::UnsupportedComparison { .. }
        )
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
