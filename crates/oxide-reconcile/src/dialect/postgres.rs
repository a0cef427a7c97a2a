//! PostgreSQL dialect (also used for CockroachDB).
//!
//! Entities are scoped to the `public` schema. PostgreSQL has no
//! `SHOW CREATE TABLE`, so table definitions are assembled server-side from
//! `pg_catalog` in a single query; views, functions and triggers use the
//! `pg_get_*def` functions. Procedures are not implemented.

use crate::connection::MetaQuery;
use crate::entity::{DiffEntry, EntityKind};

use super::{CatalogDialect, Reconstruction};

const CREATE_TABLE_SQL: &str = r#"
SELECT 'CREATE TABLE ' || quote_ident(c.relname) || E' (\n  ' ||
       array_to_string(
           ARRAY(
               SELECT quote_ident(a.attname) || ' ' || format_type(a.atttypid, a.atttypmod)
                      || CASE
                             WHEN a.attgenerated = 's'
                                 THEN ' GENERATED ALWAYS AS (' || pg_get_expr(d.adbin, d.adrelid) || ') STORED'
                             ELSE ''
                         END
                      || CASE WHEN a.attnotnull THEN ' NOT NULL' ELSE '' END
                      || CASE
                             WHEN a.attgenerated = 's' THEN ''
                             ELSE COALESCE(' DEFAULT ' || pg_get_expr(d.adbin, d.adrelid), '')
                         END
                      || CASE a.attidentity
                             WHEN 'a' THEN ' GENERATED ALWAYS AS IDENTITY'
                             WHEN 'd' THEN ' GENERATED BY DEFAULT AS IDENTITY'
                             ELSE ''
                         END
               FROM pg_attribute a
               LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
               WHERE a.attrelid = c.oid AND a.attnum > 0 AND NOT a.attisdropped
               ORDER BY a.attnum
           ) || ARRAY(
               SELECT 'CONSTRAINT ' || quote_ident(con.conname) || ' ' || pg_get_constraintdef(con.oid)
               FROM pg_constraint con
               WHERE con.conrelid = c.oid
               ORDER BY CASE con.contype WHEN 'p' THEN 0 WHEN 'u' THEN 1 WHEN 'f' THEN 2 ELSE 3 END,
                        con.conname
           ),
           E',\n  '
       ) || E'\n)'
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = 'public' AND c.relkind IN ('r', 'p') AND c.relname = $1
"#;

const CREATE_VIEW_SQL: &str = r#"
SELECT 'CREATE VIEW ' || quote_ident(c.relname) || E' AS\n' || pg_get_viewdef(c.oid, true)
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = 'public' AND c.relkind = 'v' AND c.relname = $1
"#;

const CREATE_FUNCTION_SQL: &str = r#"
SELECT pg_get_functiondef(p.oid)
FROM pg_proc p
JOIN pg_namespace n ON n.oid = p.pronamespace
WHERE n.nspname = 'public' AND p.prokind = 'f' AND p.proname = $1
ORDER BY p.oid
"#;

const CREATE_TRIGGER_SQL: &str = r#"
SELECT pg_get_triggerdef(t.oid, true)
FROM pg_trigger t
JOIN pg_class c ON c.oid = t.tgrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = 'public' AND NOT t.tgisinternal AND t.tgname = $1
"#;

const COLUMN_SQL: &str = r#"
SELECT CAST(c.ordinal_position AS TEXT),
       CAST(c.column_default AS TEXT),
       CASE
           WHEN c.is_generated = 'ALWAYS' THEN 'STORED GENERATED'
           WHEN c.is_identity = 'YES' THEN 'IDENTITY ' || CAST(c.identity_generation AS TEXT)
       END,
       CASE WHEN EXISTS (
           SELECT 1
           FROM information_schema.table_constraints tc
           JOIN information_schema.key_column_usage k
             ON k.constraint_schema = tc.constraint_schema
            AND k.constraint_name = tc.constraint_name
           WHERE tc.constraint_type = 'PRIMARY KEY'
             AND tc.table_schema = c.table_schema
             AND tc.table_name = c.table_name
             AND k.column_name = c.column_name
       ) THEN 'PRI' ELSE '' END,
       CAST(c.is_nullable AS TEXT),
       format_type(a.atttypid, a.atttypmod),
       CAST(fk.referenced_table AS TEXT),
       CAST(fk.referenced_column AS TEXT),
       CAST(c.generation_expression AS TEXT)
FROM information_schema.columns c
JOIN pg_catalog.pg_attribute a
  ON a.attrelid = to_regclass(quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))
 AND a.attname = c.column_name
LEFT JOIN LATERAL (
    SELECT ccu.table_name AS referenced_table, ccu.column_name AS referenced_column
    FROM information_schema.key_column_usage k
    JOIN information_schema.referential_constraints rc
      ON rc.constraint_schema = k.constraint_schema
     AND rc.constraint_name = k.constraint_name
    JOIN information_schema.constraint_column_usage ccu
      ON ccu.constraint_schema = rc.unique_constraint_schema
     AND ccu.constraint_name = rc.unique_constraint_name
    WHERE k.table_schema = c.table_schema
      AND k.table_name = c.table_name
      AND k.column_name = c.column_name
    LIMIT 1
) fk ON TRUE
WHERE c.table_schema = 'public' AND c.table_name = $1 AND c.column_name = $2
"#;

/// Reserved keywords, including those that are only allowed as function or
/// type names.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation", "column",
    "concurrently", "constraint", "create", "cross", "current_catalog", "current_date",
    "current_role", "current_schema", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "fetch",
    "for", "foreign", "freeze", "from", "full", "grant", "group", "having", "ilike", "in",
    "initially", "inner", "intersect", "into", "is", "isnull", "join", "lateral", "leading",
    "left", "like", "limit", "localtime", "localtimestamp", "natural", "not", "notnull", "null",
    "offset", "on", "only", "or", "order", "outer", "overlaps", "placing", "primary",
    "references", "returning", "right", "select", "session_user", "similar", "some", "symmetric",
    "system_user", "table", "tablesample", "then", "to", "trailing", "true", "union", "unique",
    "user", "using", "variadic", "verbose", "when", "where", "window", "with",
];

/// PostgreSQL catalog dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CatalogDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn list_query(&self, kind: EntityKind, _database: &str) -> Option<MetaQuery> {
        let sql = match kind {
            EntityKind::Tables => {
                "SELECT CAST(table_name AS TEXT) FROM information_schema.tables \
                 WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
            EntityKind::Columns => {
                "SELECT CAST(c.column_name AS TEXT), CAST(c.table_name AS TEXT) \
                 FROM information_schema.columns c \
                 JOIN information_schema.tables t \
                   ON t.table_schema = c.table_schema AND t.table_name = c.table_name \
                 WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE' \
                 ORDER BY c.table_name, c.ordinal_position"
            }
            EntityKind::Views => {
                "SELECT CAST(table_name AS TEXT) FROM information_schema.views \
                 WHERE table_schema = 'public' \
                 ORDER BY table_name"
            }
            EntityKind::Functions => {
                "SELECT DISTINCT CAST(routine_name AS TEXT) AS routine_name \
                 FROM information_schema.routines \
                 WHERE routine_schema = 'public' AND routine_type = 'FUNCTION' \
                 ORDER BY routine_name"
            }
            // One row per trigger event in information_schema.
            EntityKind::Triggers => {
                "SELECT DISTINCT CAST(trigger_name AS TEXT) AS trigger_name, \
                        CAST(event_object_table AS TEXT) AS event_object_table \
                 FROM information_schema.triggers \
                 WHERE trigger_schema = 'public' \
                 ORDER BY trigger_name"
            }
            EntityKind::Procedures => return None,
        };
        Some(MetaQuery::new(sql))
    }

    fn reconstruct_query(
        &self,
        kind: EntityKind,
        name: &str,
        _database: &str,
    ) -> Option<Reconstruction> {
        let sql = match kind {
            EntityKind::Tables => CREATE_TABLE_SQL,
            EntityKind::Views => CREATE_VIEW_SQL,
            EntityKind::Functions => CREATE_FUNCTION_SQL,
            EntityKind::Triggers => CREATE_TRIGGER_SQL,
            EntityKind::Columns | EntityKind::Procedures => return None,
        };
        Some(Reconstruction {
            query: MetaQuery::new(sql.trim()).bind(name),
            column: 0,
        })
    }

    fn column_query(&self, _database: &str, table: &str, column: &str) -> Option<MetaQuery> {
        Some(MetaQuery::new(COLUMN_SQL.trim()).bind(table).bind(column))
    }

    // ADD COLUMN always appends; there is no AFTER/FIRST.
    fn positions_columns(&self) -> bool {
        false
    }

    fn column_at_query(&self, _database: &str, _table: &str, _ordinal: u32) -> Option<MetaQuery> {
        None
    }

    fn is_plain_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
    }

    fn is_reserved(&self, name: &str) -> bool {
        RESERVED_WORDS.contains(&name.to_ascii_lowercase().as_str())
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn drop_statement(&self, entry: &DiffEntry) -> String {
        match (entry.kind, &entry.parent) {
            (EntityKind::Columns, Some(table)) => format!(
                "ALTER TABLE {} DROP COLUMN IF EXISTS {};",
                self.ident(table),
                self.ident(&entry.name)
            ),
            (EntityKind::Triggers, Some(table)) => format!(
                "DROP TRIGGER IF EXISTS {} ON {};",
                self.ident(&entry.name),
                self.ident(table)
            ),
            (kind, _) => format!("DROP {} IF EXISTS {};", kind.keyword(), self.ident(&entry.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ChangeKind;

    fn deleted(kind: EntityKind, name: &str, parent: Option<&str>) -> DiffEntry {
        DiffEntry {
            kind,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            change: ChangeKind::ToDelete,
        }
    }

    #[test]
    fn test_procedures_are_not_implemented() {
        let d = PostgresDialect::new();
        assert!(d.list_query(EntityKind::Procedures, "shop").is_none());
        assert!(
            d.reconstruct_query(EntityKind::Procedures, "p", "shop")
                .is_none()
        );
    }

    #[test]
    fn test_table_listing_is_public_base_tables() {
        let query = PostgresDialect::new()
            .list_query(EntityKind::Tables, "shop")
            .unwrap();
        assert!(query.sql.contains("table_schema = 'public'"));
        assert!(query.sql.contains("'BASE TABLE'"));
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_reconstruction_binds_name() {
        let r = PostgresDialect::new()
            .reconstruct_query(EntityKind::Views, "active_users", "shop")
            .unwrap();
        assert!(r.query.sql.contains("pg_get_viewdef"));
        assert_eq!(r.query.params, vec!["active_users".to_string()]);
        assert_eq!(r.column, 0);
    }

    #[test]
    fn test_no_column_positioning() {
        assert!(
            PostgresDialect::new()
                .column_at_query("shop", "users", 2)
                .is_none()
        );
        assert!(!PostgresDialect::new().positions_columns());
    }

    #[test]
    fn test_drop_statements() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.drop_statement(&deleted(EntityKind::Tables, "archive", None)),
            "DROP TABLE IF EXISTS archive;"
        );
        assert_eq!(
            d.drop_statement(&deleted(EntityKind::Triggers, "audit", Some("users"))),
            "DROP TRIGGER IF EXISTS audit ON users;"
        );
        assert_eq!(
            d.drop_statement(&deleted(EntityKind::Columns, "Email", Some("users"))),
            "ALTER TABLE users DROP COLUMN IF EXISTS \"Email\";"
        );
    }

    #[test]
    fn test_reserved_words_are_quoted() {
        let d = PostgresDialect::new();
        assert_eq!(d.ident("window"), "\"window\"");
        assert_eq!(d.ident("user"), "\"user\"");
        assert_eq!(d.ident("rank"), "rank");
        assert_eq!(
            d.drop_statement(&deleted(EntityKind::Columns, "order", Some("users"))),
            "ALTER TABLE users DROP COLUMN IF EXISTS \"order\";"
        );
    }
}
