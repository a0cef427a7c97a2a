//! Database dialect implementations.
//!
//! Each dialect knows the metadata queries that enumerate and reconstruct
//! entities, and the DDL syntax for dropping them. Dispatch is an exhaustive
//! match over [`Dialect`] and [`EntityKind`]; a combination a dialect does
//! not implement returns `None`, which callers turn into
//! [`crate::error::ReconcileError::UnsupportedOperation`].

mod mysql;
mod postgres;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use serde::{Deserialize, Serialize};

use crate::connection::MetaQuery;
use crate::entity::{DiffEntry, EntityKind};

/// Concrete database engine of a saved connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// MySQL.
    #[value(name = "mysql")]
    MySql,
    /// MariaDB.
    #[value(name = "mariadb")]
    MariaDb,
    /// PostgreSQL.
    Postgres,
    /// CockroachDB.
    #[value(name = "cockroachdb")]
    CockroachDb,
}

impl Engine {
    /// Dialect family used for dispatch.
    #[must_use]
    pub fn dialect(self) -> Dialect {
        match self {
            Self::MySql | Self::MariaDb => Dialect::MySql,
            Self::Postgres | Self::CockroachDb => Dialect::Postgres,
        }
    }

    /// Default TCP port.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::MySql | Self::MariaDb => 3306,
            Self::Postgres => 5432,
            Self::CockroachDb => 26257,
        }
    }

    /// Lowercase engine name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Postgres => "postgres",
            Self::CockroachDb => "cockroachdb",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// SQL dialect family. Sub-variants of an [`Engine`] are treated as identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL and CockroachDB.
    Postgres,
}

impl Dialect {
    /// Returns the catalog implementation for this family.
    #[must_use]
    pub fn catalog(self) -> &'static dyn CatalogDialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.catalog().name())
    }
}

/// A query returning an entity's canonical creation statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// Metadata query to run on the reference connection.
    pub query: MetaQuery,
    /// Index of the result column holding the statement.
    pub column: usize,
}

/// Trait for dialect-specific metadata queries and DDL syntax.
pub trait CatalogDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Query listing the entities of `kind`, ordered by name.
    ///
    /// Rows are `(name, parent)`; the parent cell is optional.
    fn list_query(&self, kind: EntityKind, database: &str) -> Option<MetaQuery>;

    /// Query returning the canonical creation statement of an entity.
    fn reconstruct_query(
        &self,
        kind: EntityKind,
        name: &str,
        database: &str,
    ) -> Option<Reconstruction>;

    /// Query describing one column.
    ///
    /// Rows are `(ordinal, default, extra, key, is_nullable, type,
    /// referenced_table, referenced_column, generation_expression)`.
    fn column_query(&self, database: &str, table: &str, column: &str) -> Option<MetaQuery>;

    /// Returns whether `ADD COLUMN` accepts `AFTER <column>` / `FIRST`.
    fn positions_columns(&self) -> bool;

    /// Query returning the name of the column at `ordinal` in `table`.
    ///
    /// `None` when the dialect cannot place a new column (it always appends).
    fn column_at_query(&self, database: &str, table: &str, ordinal: u32) -> Option<MetaQuery>;

    /// Returns whether `name` can be emitted without quoting.
    fn is_plain_identifier(&self, name: &str) -> bool;

    /// Returns whether `name` is a reserved keyword of the dialect.
    fn is_reserved(&self, name: &str) -> bool;

    /// Quotes an identifier unconditionally.
    fn quote_identifier(&self, name: &str) -> String;

    /// Emits an identifier for generated DDL, quoting only when needed.
    fn ident(&self, name: &str) -> String {
        if self.is_plain_identifier(name) && !self.is_reserved(name) {
            name.to_string()
        } else {
            self.quote_identifier(name)
        }
    }

    /// Renders a column default as reported by the catalog into DDL.
    ///
    /// `expression` is set when the server flagged the default as an
    /// expression rather than a literal.
    fn default_value(&self, value: &str, _data_type: &str, _expression: bool) -> String {
        value.to_string()
    }

    /// `DROP ... IF EXISTS` statement for an entity that exists only on the comparison side.
    fn drop_statement(&self, entry: &DiffEntry) -> String;
}
