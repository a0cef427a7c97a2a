//! Schema reconciliation between two live databases.
//!
//! `oxide-reconcile` compares the schemas of two databases of the same
//! dialect family (MySQL/MariaDB or PostgreSQL/CockroachDB) and generates
//! the DDL that would bring the second in line with the first. It never
//! executes what it generates.
//!
//! # Architecture
//!
//! - **Catalog** - Lists tables, columns, views, procedures, functions and
//!   triggers, and reads their definitions
//! - **Diff** - Classifies entities present on only one side as to-create or
//!   to-delete
//! - **Patch** - Generates `CREATE`/`ADD COLUMN`/`DROP` statements, memoized
//!   per entity
//! - **Session** - Per-tab confirmation gate, cached diffs, focus and the
//!   generated SQL surface
//! - **Dialect** - Metadata queries and DDL syntax per dialect family
//!
//! The engine talks to databases only through the [`connection::Connection`]
//! trait. [`database::DatabaseConnection`] implements it with sqlx.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_reconcile::prelude::*;
//!
//! let first = DatabaseConnection::connect(&store.get("prod")?).await?;
//! let second = DatabaseConnection::connect(&store.get("staging")?).await?;
//!
//! let mut session = Session::new(&first, &second, PatchOptions::default())?;
//! session.handle(Event::Confirm).await;
//! session.handle(Event::GenerateAll).await;
//! println!("{}", session.sql_text());
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! oxide-reconcile add-connection --name prod --dialect mysql --host db1 --user app --database shop
//! oxide-reconcile list-connections
//! oxide-reconcile compare --first prod --second staging
//! ```

pub mod catalog;
pub mod column;
pub mod connection;
pub mod console;
pub mod database;
pub mod dialect;
pub mod diff;
pub mod entity;
pub mod error;
pub mod patch;
pub mod profile;
pub mod session;

#[cfg(test)]
mod test_support;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::column::{ColumnExtra, ColumnMetadata, ColumnPosition, ForeignKeyTarget};
    pub use crate::connection::{Connection, MetaQuery, MetaRow};
    pub use crate::database::DatabaseConnection;
    pub use crate::dialect::{CatalogDialect, Dialect, Engine, MySqlDialect, PostgresDialect};
    pub use crate::diff::diff_entities;
    pub use crate::entity::{
        ChangeKind, DiffEntry, EntityIdentifier, EntityKey, EntityKind, GeneratedPatch,
    };
    pub use crate::error::{Operation, ReconcileError, Result};
    pub use crate::patch::{ForeignKeyCheck, PatchGenerator, PatchOptions};
    pub use crate::profile::{ConnectionProfile, ProfileConfig, ProfileStore};
    pub use crate::session::{Event, Focus, Notice, Session, TabState};
}
