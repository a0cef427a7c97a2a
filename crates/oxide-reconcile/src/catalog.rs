//! Entity enumeration and the other metadata reads.
//!
//! A [`Catalog`] borrows one connection and dispatches every read through
//! the connection's [`CatalogDialect`]. A combination the dialect does not
//! implement is reported as
//! [`ReconcileError::UnsupportedOperation`], never as an empty result.

use std::collections::HashSet;

use tracing::debug;

use crate::column::{ColumnMetadata, ColumnPosition};
use crate::connection::{Connection, MetaQuery, MetaRow};
use crate::dialect::CatalogDialect;
use crate::entity::{EntityIdentifier, EntityKind};
use crate::error::{Operation, ReconcileError, Result};

/// Read-only view of one database's schema.
pub struct Catalog<'a, C: Connection> {
    conn: &'a C,
}

impl<C: Connection> Clone for Catalog<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Connection> Copy for Catalog<'_, C> {}

impl<'a, C: Connection> Catalog<'a, C> {
    /// Creates a catalog over a borrowed connection.
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &'a C {
        self.conn
    }

    /// Returns the dialect implementation of the connection.
    pub fn dialect(&self) -> &'static dyn CatalogDialect {
        self.conn.dialect().catalog()
    }

    fn unsupported(&self, kind: EntityKind, operation: Operation) -> ReconcileError {
        ReconcileError::UnsupportedOperation {
            dialect: self.conn.dialect(),
            kind,
            operation,
        }
    }

    async fn run(&self, kind: EntityKind, query: &MetaQuery) -> Result<Vec<MetaRow>> {
        debug!(
            database = %self.conn.database_name(),
            kind = %kind,
            sql = %query.sql,
            "Running metadata query"
        );
        self.conn
            .fetch(query)
            .await
            .map_err(|source| ReconcileError::QueryFailed { kind, source })
    }

    /// Lists the entities of `kind` in the order the database reports them.
    ///
    /// Columns and triggers carry their table as parent. Columns come in
    /// ordinal order within each table. Duplicate rows are dropped.
    pub async fn entities(&self, kind: EntityKind) -> Result<Vec<EntityIdentifier>> {
        let query = self
            .dialect()
            .list_query(kind, self.conn.database_name())
            .ok_or_else(|| self.unsupported(kind, Operation::Enumerate))?;
        let rows = self.run(kind, &query).await?;

        let mut seen = HashSet::new();
        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(identifier) = parse_identifier(kind, row) else {
                continue;
            };
            let key = (identifier.parent.clone(), identifier.name.clone());
            let key = match kind {
                EntityKind::Columns => key,
                _ => (None, key.1),
            };
            if seen.insert(key) {
                entities.push(identifier);
            }
        }

        debug!(kind = %kind, count = entities.len(), "Listed entities");
        Ok(entities)
    }

    /// Names of the base tables.
    pub async fn table_names(&self) -> Result<HashSet<String>> {
        Ok(self
            .entities(EntityKind::Tables)
            .await?
            .into_iter()
            .map(|identifier| identifier.name)
            .collect())
    }

    /// Canonical creation statement of a non-column entity, terminated by `;`.
    ///
    /// Several rows (overloaded functions) are joined into one script.
    pub async fn definition(&self, kind: EntityKind, name: &str) -> Result<String> {
        let reconstruction = self
            .dialect()
            .reconstruct_query(kind, name, self.conn.database_name())
            .ok_or_else(|| self.unsupported(kind, Operation::Reconstruct))?;
        let rows = self.run(kind, &reconstruction.query).await?;

        let statements: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get_non_empty(reconstruction.column))
            .map(terminate)
            .collect();

        if statements.is_empty() {
            return Err(ReconcileError::DefinitionNotFound {
                kind,
                name: name.to_string(),
            });
        }
        Ok(statements.join("\n\n"))
    }

    /// Full metadata of one column.
    pub async fn column(&self, table: &str, column: &str) -> Result<ColumnMetadata> {
        let kind = EntityKind::Columns;
        let query = self
            .dialect()
            .column_query(self.conn.database_name(), table, column)
            .ok_or_else(|| self.unsupported(kind, Operation::Describe))?;
        let rows = self.run(kind, &query).await?;

        rows.iter()
            .find_map(|row| ColumnMetadata::from_row(table, column, row))
            .ok_or_else(|| ReconcileError::DefinitionNotFound {
                kind,
                name: format!("{table}.{column}"),
            })
    }

    /// Name of the column at `ordinal` in `table`, if there is one.
    pub async fn column_at(&self, table: &str, ordinal: u32) -> Result<Option<String>> {
        let Some(query) = self
            .dialect()
            .column_at_query(self.conn.database_name(), table, ordinal)
        else {
            return Ok(None);
        };
        let rows = self.run(EntityKind::Columns, &query).await?;
        Ok(rows
            .iter()
            .find_map(|row| row.get_non_empty(0))
            .map(str::to_string))
    }

    /// Where a new copy of `column` should be placed.
    ///
    /// `None` when the dialect always appends, or when the predecessor
    /// cannot be found.
    pub async fn column_position(&self, column: &ColumnMetadata) -> Result<Option<ColumnPosition>> {
        if !self.dialect().positions_columns() {
            return Ok(None);
        }
        match column.predecessor_ordinal() {
            None => Ok(Some(ColumnPosition::First)),
            Some(ordinal) => Ok(self
                .column_at(&column.table, ordinal)
                .await?
                .map(ColumnPosition::After)),
        }
    }
}

fn parse_identifier(kind: EntityKind, row: &MetaRow) -> Option<EntityIdentifier> {
    let name = row.get_non_empty(0)?;
    match kind {
        EntityKind::Columns => {
            let table = row.get_non_empty(1)?;
            Some(EntityIdentifier::column(table, name))
        }
        EntityKind::Triggers => {
            let identifier = EntityIdentifier::new(name);
            Some(match row.get_non_empty(1) {
                Some(table) => identifier.with_parent(table),
                None => identifier,
            })
        }
        _ => Some(EntityIdentifier::new(name)),
    }
}

fn terminate(statement: &str) -> String {
    let statement = statement.trim_end();
    if statement.ends_with(';') {
        statement.to_string()
    } else {
        format!("{statement};")
    }
}
