//! Scripted in-memory connection for unit tests.
//!
//! Integration tests cannot see `cfg(test)` items, so `tests/common` keeps
//! its own copy built on the public API.

use std::cell::RefCell;

use crate::connection::{Connection, MetaQuery, MetaRow};
use crate::dialect::Dialect;

struct Route {
    needle: String,
    params: Option<Vec<String>>,
    result: Result<Vec<MetaRow>, String>,
}

/// Answers queries by substring match on the SQL, latest route first.
pub(crate) struct FakeConnection {
    dialect: Dialect,
    database: String,
    routes: RefCell<Vec<Route>>,
    log: RefCell<Vec<MetaQuery>>,
}

impl FakeConnection {
    pub(crate) fn new(dialect: Dialect, database: &str) -> Self {
        Self {
            dialect,
            database: database.to_string(),
            routes: RefCell::new(Vec::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn route(&self, needle: &str, rows: Vec<MetaRow>) {
        self.push(needle, None, Ok(rows));
    }

    pub(crate) fn route_with(&self, needle: &str, params: &[&str], rows: Vec<MetaRow>) {
        let params = params.iter().map(|p| (*p).to_string()).collect();
        self.push(needle, Some(params), Ok(rows));
    }

    pub(crate) fn fail(&self, needle: &str, message: &str) {
        self.push(needle, None, Err(message.to_string()));
    }

    pub(crate) fn query_count(&self) -> usize {
        self.log.borrow().len()
    }

    fn push(&self, needle: &str, params: Option<Vec<String>>, result: Result<Vec<MetaRow>, String>) {
        self.routes.borrow_mut().push(Route {
            needle: needle.to_string(),
            params,
            result,
        });
    }
}

impl Connection for FakeConnection {
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

/// Rows with a single non-NULL cell each.
pub(crate) fn names(values: &[&str]) -> Vec<MetaRow> {
    values.iter().map(|v| MetaRow::text(&[*v])).collect()
}
