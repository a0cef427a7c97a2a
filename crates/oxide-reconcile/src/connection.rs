//! The connection collaborator.
//!
//! The engine never opens, pools or closes connections. It only needs a
//! dialect tag, the database name and a "run query, get rows" primitive,
//! which is what [`Connection`] describes. [`crate::database`] provides the
//! sqlx-backed implementation used by the binary.

use crate::dialect::Dialect;

/// A parameterized metadata query.
///
/// Placeholders follow the dialect (`?` for MySQL, `$n` for PostgreSQL);
/// parameters are always bound as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaQuery {
    /// SQL text.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<String>,
}

impl MetaQuery {
    /// Creates a query without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// One result row, every cell read as optional text.
///
/// Numeric metadata is cast to text in SQL so a single row shape serves
/// every dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaRow {
    cells: Vec<Option<String>>,
}

impl MetaRow {
    /// Creates a row from cells.
    #[must_use]
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Creates a row where every cell is non-NULL.
    #[must_use]
    pub fn text<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            cells: values.iter().map(|v| Some(v.as_ref().to_string())).collect(),
        }
    }

    /// Returns the cell at `index`, or `None` when NULL or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// Returns the cell at `index` when it is non-NULL and not blank.
    #[must_use]
    pub fn get_non_empty(&self, index: usize) -> Option<&str> {
        self.get(index).filter(|s| !s.trim().is_empty())
    }

    /// Returns the cell at `index` parsed as an unsigned integer.
    #[must_use]
    pub fn get_u32(&self, index: usize) -> Option<u32> {
        self.get(index).and_then(|s| s.trim().parse().ok())
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<Option<String>>> for MetaRow {
    fn from(cells: Vec<Option<String>>) -> Self {
        Self::new(cells)
    }
}

/// A borrowed capability to run read-only metadata queries against one database.
///
/// Queries are issued one at a time and awaited to completion; the engine
/// never holds two in flight.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Dialect family of the database.
    fn dialect(&self) -> Dialect;

    /// Name of the database (MySQL schema) being compared.
    fn database_name(&self) -> &str;

    /// Runs a query and returns every row.
    async fn fetch(&self, query: &MetaQuery) -> Result<Vec<MetaRow>, sqlx::Error>;
}
