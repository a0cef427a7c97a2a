//! DDL patch generation.
//!
//! [`PatchGenerator`] turns a [`DiffEntry`] into the statement that
//! reconciles it:
//!
//! - `ToDelete` entries get a `DROP ... IF EXISTS` statement, built without
//!   touching either database.
//! - `ToCreate` entries reuse the reference database's own creation statement,
//!   except columns, which are rebuilt as `ALTER TABLE ... ADD COLUMN`.
//!
//! Every statement is generated at most once per generator; later requests
//! for the same entity return the memoized text without querying.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::connection::Connection;
use crate::entity::{ChangeKind, DiffEntry, EntityKey, EntityKind};
use crate::error::{ReconcileError, Result};

/// How a column's `REFERENCES` clause is treated when the referenced table
/// does not exist on the comparison side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ForeignKeyCheck {
    /// Emit the clause without checking.
    #[default]
    Trust,
    /// Emit the clause, preceded by a warning comment.
    Annotate,
    /// Leave the clause out.
    Omit,
}

/// Options for patch generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Foreign key policy for new columns.
    pub foreign_keys: ForeignKeyCheck,
}

impl PatchOptions {
    /// Sets the foreign key policy.
    #[must_use]
    pub fn foreign_keys(mut self, check: ForeignKeyCheck) -> Self {
        self.foreign_keys = check;
        self
    }
}

/// Memoizing generator of reconciliation statements.
pub struct PatchGenerator<'c, C: Connection> {
    /// Reference side, holder of the authoritative definitions.
    first: Catalog<'c, C>,
    /// Comparison side, only read for the foreign key policy.
    second: Catalog<'c, C>,
    options: PatchOptions,
    generated: HashMap<EntityKey, String>,
    target_tables: Option<HashSet<String>>,
}

impl<'c, C: Connection> PatchGenerator<'c, C> {
    /// Creates a generator for a pair of connections of the same dialect family.
    pub fn new(first: &'c C, second: &'c C, options: PatchOptions) -> Result<Self> {
        if first.dialect() != second.dialect() {
            return Err(ReconcileError::UnsupportedComparison {
                first: first.dialect(),
                second: second.dialect(),
            });
        }
        Ok(Self {
            first: Catalog::new(first),
            second: Catalog::new(second),
            options,
            generated: HashMap::new(),
            target_tables: None,
        })
    }

    /// Returns the options in use.
    pub fn options(&self) -> PatchOptions {
        self.options
    }

    /// Returns whether a statement has already been generated for `key`.
    pub fn is_generated(&self, key: &EntityKey) -> bool {
        self.generated.contains_key(key)
    }

    /// Returns the memoized statement for `key`, if any.
    pub fn get(&self, key: &EntityKey) -> Option<&str> {
        self.generated.get(key).map(String::as_str)
    }

    /// Generates (or recalls) the statement reconciling `entry`.
    pub async fn generate(&mut self, entry: &DiffEntry) -> Result<String> {
        let key = entry.key();
        if let Some(sql) = self.generated.get(&key) {
            debug!(kind = %entry.kind, name = %entry.name, "Reusing generated SQL");
            return Ok(sql.clone());
        }

        let sql = match entry.change {
            ChangeKind::ToDelete => self.first.dialect().drop_statement(entry),
            ChangeKind::ToCreate => match entry.kind {
                EntityKind::Columns => self.add_column(entry).await?,
                kind => self.first.definition(kind, &entry.name).await?,
            },
        };

        info!(
            kind = %entry.kind,
            name = %entry.display_name(),
            change = %entry.change,
            "Generated SQL"
        );
        self.generated.insert(key, sql.clone());
        Ok(sql)
    }

    async fn add_column(&mut self, entry: &DiffEntry) -> Result<String> {
        let table = entry
            .parent
            .as_deref()
            .ok_or_else(|| ReconcileError::DefinitionNotFound {
                kind: EntityKind::Columns,
                name: entry.name.clone(),
            })?;

        let mut column = self.first.column(table, &entry.name).await?;
        let position = self.first.column_position(&column).await?;

        let mut warning = None;
        if self.options.foreign_keys != ForeignKeyCheck::Trust
            && let Some(target) = column.references.clone()
            && !self.target_has_table(&target.table).await?
        {
            match self.options.foreign_keys {
                ForeignKeyCheck::Annotate => {
                    warning = Some(format!(
                        "-- referenced table {} does not exist on the target database",
                        target.table
                    ));
                }
                ForeignKeyCheck::Omit => column.references = None,
                ForeignKeyCheck::Trust => {}
            }
        }

        let sql = column.add_column_sql(self.first.dialect(), position.as_ref());
        Ok(match warning {
            Some(warning) => format!("{warning}\n{sql}"),
            None => sql,
        })
    }

    async fn target_has_table(&mut self, table: &str) -> Result<bool> {
        if self.target_tables.is_none() {
            self.target_tables = Some(self.second.table_names().await?);
        }
        Ok(self
            .target_tables
            .as_ref()
            .is_some_and(|tables| tables.contains(table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetaRow;
    use crate::dialect::Dialect;
    use crate::test_support::{FakeConnection, names};

    fn entry(kind: EntityKind, name: &str, parent: Option<&str>, change: ChangeKind) -> DiffEntry {
        DiffEntry {
            kind,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            change,
        }
    }

    fn column_row(ordinal: &str, ref_table: Option<&str>) -> MetaRow {
        MetaRow::new(vec![
            Some(ordinal.to_string()),
            None,
            Some(String::new()),
            Some(String::new()),
            Some("NO".to_string()),
            Some("int".to_string()),
            ref_table.map(str::to_string),
            ref_table.map(|_| "id".to_string()),
            None,
        ])
    }

    fn mysql_pair() -> (FakeConnection, FakeConnection) {
        (
            FakeConnection::new(Dialect::MySql, "shop"),
            FakeConnection::new(Dialect::MySql, "shop"),
        )
    }

    #[test]
    fn test_cross_family_is_rejected() {
        let first = FakeConnection::new(Dialect::MySql, "shop");
        let second = FakeConnection::new(Dialect::Postgres, "shop");
        let err = PatchGenerator::new(&first, &second, PatchOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ReconcileError::UnsupportedComparison { .. }));
    }

    #[tokio::test]
    async fn test_drop_needs_no_query() {
        let (first, second) = mysql_pair();
        let mut generator = PatchGenerator::new(&first, &second, PatchOptions::default()).unwrap();
        let sql = generator
            .generate(&entry(EntityKind::Tables, "archive", None, ChangeKind::ToDelete))
            .await
            .unwrap();
        assert_eq!(sql, "DROP TABLE IF EXISTS archive;");
        assert_eq!(first.query_count() + second.query_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_is_memoized() {
        let (first, second) = mysql_pair();
        first.route(
            "SHOW CREATE VIEW",
            vec![MetaRow::text(&["v", "CREATE VIEW `v` AS select 1", "utf8mb4", "utf8mb4_0900_ai_ci"])],
        );
        let mut generator = PatchGenerator::new(&first, &second, PatchOptions::default()).unwrap();
        let e = entry(EntityKind::Views, "v", None, ChangeKind::ToCreate);

        let a = generator.generate(&e).await.unwrap();
        let b = generator.generate(&e).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "CREATE VIEW `v` AS select 1;");
        assert_eq!(first.query_count(), 1);
        assert!(generator.is_generated(&e.key()));
        assert_eq!(generator.get(&e.key()), Some(a.as_str()));
    }

    #[tokio::test]
    async fn test_failed_generation_is_not_memoized() {
        let (first, second) = mysql_pair();
        first.fail("SHOW CREATE TABLE", "lost connection");
        let mut generator = PatchGenerator::new(&first, &second, PatchOptions::default()).unwrap();
        let e = entry(EntityKind::Tables, "orders", None, ChangeKind::ToCreate);

        assert!(generator.generate(&e).await.is_err());
        assert!(!generator.is_generated(&e.key()));

        first.route(
            "SHOW CREATE TABLE",
            vec![MetaRow::text(&["orders", "CREATE TABLE `orders` (`id` int)"])],
        );
        assert!(generator.generate(&e).await.is_ok());
    }

    #[tokio::test]
    async fn test_postgres_procedure_is_unsupported() {
        let first = FakeConnection::new(Dialect::Postgres, "shop");
        let second = FakeConnection::new(Dialect::Postgres, "shop");
        let mut generator = PatchGenerator::new(&first, &second, PatchOptions::default()).unwrap();
        let err = generator
            .generate(&entry(EntityKind::Procedures, "p", None, ChangeKind::ToCreate))
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[tokio::test]
    async fn test_foreign_key_trust_does_not_read_target() {
        let (first, second) = mysql_pair();
        first.route("C.GENERATION_EXPRESSION", vec![column_row("1", Some("customers"))]);
        let mut generator = PatchGenerator::new(&first, &second, PatchOptions::default()).unwrap();
        let sql = generator
            .generate(&entry(EntityKind::Columns, "customer_id", Some("orders"), ChangeKind::ToCreate))
            .await
            .unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE orders ADD COLUMN customer_id int NOT NULL REFERENCES customers(id) FIRST;"
        );
        assert_eq!(second.query_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_key_annotate_and_omit() {
        let (first, second) = mysql_pair();
        first.route("C.GENERATION_EXPRESSION", vec![column_row("1", Some("customers"))]);
        second.route("SHOW FULL TABLES", names(&["orders"]));

        let options = PatchOptions::default().foreign_keys(ForeignKeyCheck::Annotate);
        let mut generator = PatchGenerator::new(&first, &second, options).unwrap();
        let sql = generator
            .generate(&entry(EntityKind::Columns, "customer_id", Some("orders"), ChangeKind::ToCreate))
            .await
            .unwrap();
        assert!(sql.starts_with("-- referenced table customers does not exist"));
        assert!(sql.ends_with("REFERENCES customers(id) FIRST;"));

        let options = PatchOptions::default().foreign_keys(ForeignKeyCheck::Omit);
        let mut generator = PatchGenerator::new(&first, &second, options).unwrap();
        let sql = generator
            .generate(&entry(EntityKind::Columns, "customer_id", Some("orders"), ChangeKind::ToCreate))
            .await
            .unwrap();
        assert_eq!(sql, "ALTER TABLE orders ADD COLUMN customer_id int NOT NULL FIRST;");
    }

    #[tokio::test]
    async fn test_target_tables_read_once() {
        let (first, second) = mysql_pair();
        first.route("C.GENERATION_EXPRESSION", vec![column_row("1", Some("customers"))]);
        second.route("SHOW FULL TABLES", names(&["customers"]));

        let options = PatchOptions::default().foreign_keys(ForeignKeyCheck::Omit);
        let mut generator = PatchGenerator::new(&first, &second, options).unwrap();
        for table in ["orders", "invoices"] {
            let sql = generator
                .generate(&entry(EntityKind::Columns, "customer_id", Some(table), ChangeKind::ToCreate))
                .await
                .unwrap();
            assert!(sql.contains("REFERENCES customers(id)"));
        }
        assert_eq!(second.query_count(), 1);
    }

    #[test]
    fn test_foreign_key_check_names() {
        use clap::ValueEnum;

        assert_eq!(
            ForeignKeyCheck::from_str("annotate", false),
            Ok(ForeignKeyCheck::Annotate)
        );
        let names: Vec<_> = ForeignKeyCheck::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["trust", "annotate", "omit"]);
    }
}
