//! Scripted connection for integration tests. Mirrors the crate's private
//! unit-test double, which is not visible from here.

#![allow(dead_code)]

use std::cell::RefCell;

use oxide_reconcile::prelude::{Connection, Dialect, MetaQuery, MetaRow};

struct Route {
    needle: String,
    params: Option<Vec<String>>,
    result: Result<Vec<MetaRow>, String>,
}

/// In-memory database answering metadata queries from scripted routes.
///
/// The most recently added route whose needle occurs in the SQL (and whose
/// parameters match, when given) wins. Unmatched queries return no rows.
/// Every query is recorded.
pub struct ScriptedDb {
    dialect: Dialect,
    database: String,
    routes: RefCell<Vec<Route>>,
    log: RefCell<Vec<MetaQuery>>,
}

impl ScriptedDb {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            database: "shop".to_string(),
            routes: RefCell::new(Vec::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn mysql() -> Self {
        Self::new(Dialect::MySql)
    }

    pub fn postgres() -> Self {
        Self::new(Dialect::Postgres)
    }

    pub fn on(&self, needle: &str, rows: Vec<MetaRow>) -> &Self {
        self.push(needle, None, Ok(rows));
        self
    }

    pub fn on_params(&self, needle: &str, params: &[&str], rows: Vec<MetaRow>) -> &Self {
        let params = params.iter().map(|p| (*p).to_string()).collect();
        self.push(needle, Some(params), Ok(rows));
        self
    }

    pub fn fail_on(&self, needle: &str, message: &str) -> &Self {
        self.push(needle, None, Err(message.to_string()));
        self
    }

    pub fn query_count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn queries(&self) -> Vec<MetaQuery> {
        self.log.borrow().clone()
    }

    fn push(&self, needle: &str, params: Option<Vec<String>>, result: Result<Vec<MetaRow>, String>) {
        self.routes.borrow_mut().push(Route {
            needle: needle.to_string(),
            params,
            result,
        });
    }
}

impl Connection for ScriptedDb {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn fetch(&self, query: &MetaQuery) -> Result<Vec<MetaRow>, sqlx::Error> {
        self.log.borrow_mut().push(query.clone());
        let routes = self.routes.borrow();
        let route = routes.iter().rev().find(|route| {
            query.sql.contains(&route.needle)
                && route.params.as_ref().is_none_or(|p| *p == query.params)
        });
        match route.map(|r| &r.result) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(message)) => Err(sqlx::Error::Protocol(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// One single-cell row per value.
pub fn rows(values: &[&str]) -> Vec<MetaRow> {
    values.iter().map(|v| MetaRow::text(&[*v])).collect()
}

/// Column listing rows for `(table, column)` pairs.
pub fn column_rows(columns: &[(&str, &str)]) -> Vec<MetaRow> {
    columns
        .iter()
        .map(|(table, name)| MetaRow::text(&[*name, *table]))
        .collect()
}

/// A column description row: `(ordinal, default, extra, key, nullable, type, ref table, ref column, generation)`.
pub fn describe(ordinal: u32, data_type: &str, nullable: bool) -> MetaRow {
    MetaRow::new(vec![
        Some(ordinal.to_string()),
        None,
        Some(String::new()),
        Some(String::new()),
        Some(if nullable { "YES" } else { "NO" }.to_string()),
        Some(data_type.to_string()),
        None,
        None,
        None,
    ])
}

/// SQL needles of the MySQL metadata queries.
pub mod mysql {
    pub const TABLES: &str = "SHOW FULL TABLES";
    pub const COLUMNS: &str = "JOIN information_schema.TABLES T";
    pub const VIEWS: &str = "TABLE_TYPE = 'VIEW'";
    pub const DESCRIBE_COLUMN: &str = "C.GENERATION_EXPRESSION";
    pub const COLUMN_AT: &str = "ORDINAL_POSITION = ?";
}
