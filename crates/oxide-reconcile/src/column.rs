//! Column metadata and `ADD COLUMN` synthesis.
//!
//! The column patch is the only one the engine composes itself rather than
//! reusing the server's own creation statement, so this module holds the
//! clause assembly and the structured reading of the `EXTRA` attribute.

use crate::connection::MetaRow;
use crate::dialect::CatalogDialect;

/// Storage of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedStorage {
    /// Computed on read.
    Virtual,
    /// Computed on write and stored.
    Stored,
}

/// Identity generation mode (PostgreSQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// `GENERATED ALWAYS AS IDENTITY`.
    Always,
    /// `GENERATED BY DEFAULT AS IDENTITY`.
    ByDefault,
}

/// Structured form of a column's `EXTRA` attribute.
///
/// `DEFAULT_GENERATED` is not emitted as a clause. It only tells the dialect
/// that the default is an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnExtra {
    /// `auto_increment`.
    pub auto_increment: bool,
    /// `DEFAULT_GENERATED` marker on expression defaults.
    pub default_generated: bool,
    /// `on update <expr>`.
    pub on_update: Option<String>,
    /// `VIRTUAL GENERATED` / `STORED GENERATED`.
    pub generated: Option<GeneratedStorage>,
    /// `IDENTITY ALWAYS` / `IDENTITY BY DEFAULT`.
    pub identity: Option<Identity>,
    /// `INVISIBLE`.
    pub invisible: bool,
    /// Tokens not recognized above, kept verbatim.
    pub other: Vec<String>,
}

impl ColumnExtra {
    /// Parses an `EXTRA` value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let is = |i: usize, word: &str| tokens.get(i).is_some_and(|t| t.eq_ignore_ascii_case(word));

        let mut extra = Self::default();
        let mut i = 0;
        while i < tokens.len() {
            if is(i, "auto_increment") {
                extra.auto_increment = true;
                i += 1;
            } else if is(i, "DEFAULT_GENERATED") {
                extra.default_generated = true;
                i += 1;
            } else if is(i, "on") && is(i + 1, "update") && i + 2 < tokens.len() {
                extra.on_update = Some(tokens[i + 2].to_string());
                i += 3;
            } else if is(i, "VIRTUAL") && is(i + 1, "GENERATED") {
                extra.generated = Some(GeneratedStorage::Virtual);
                i += 2;
            } else if (is(i, "STORED") || is(i, "PERSISTENT")) && is(i + 1, "GENERATED") {
                extra.generated = Some(GeneratedStorage::Stored);
                i += 2;
            } else if is(i, "IDENTITY") && is(i + 1, "ALWAYS") {
                extra.identity = Some(Identity::Always);
                i += 2;
            } else if is(i, "IDENTITY") && is(i + 1, "BY") && is(i + 2, "DEFAULT") {
                extra.identity = Some(Identity::ByDefault);
                i += 3;
            } else if is(i, "INVISIBLE") {
                extra.invisible = true;
                i += 1;
            } else {
                extra.other.push(tokens[i].to_string());
                i += 1;
            }
        }
        extra
    }

    /// Clauses to append after the default, in output order.
    fn clauses(&self) -> Vec<String> {
        let mut clauses = Vec::new();
        if self.auto_increment {
            clauses.push("AUTO_INCREMENT".to_string());
        }
        if let Some(expr) = &self.on_update {
            clauses.push(format!("ON UPDATE {expr}"));
        }
        match self.identity {
            Some(Identity::Always) => clauses.push("GENERATED ALWAYS AS IDENTITY".to_string()),
            Some(Identity::ByDefault) => {
                clauses.push("GENERATED BY DEFAULT AS IDENTITY".to_string());
            }
            None => {}
        }
        if self.invisible {
            clauses.push("INVISIBLE".to_string());
        }
        clauses.extend(self.other.iter().cloned());
        clauses
    }
}

/// Table and column a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Where a new column goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// Before every other column.
    First,
    /// Right after the named column.
    After(String),
}

/// Everything the reference database reports about one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Owning table.
    pub table: String,
    /// Column name.
    pub name: String,
    /// 1-based ordinal position.
    pub ordinal_position: u32,
    /// Declared type, e.g. `varchar(255)`.
    pub data_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default as reported by the catalog.
    pub default: Option<String>,
    /// Parsed `EXTRA` attribute.
    pub extra: ColumnExtra,
    /// Whether the column belongs to the primary key.
    pub primary_key: bool,
    /// Foreign key target. Its existence on the comparison side is not checked here.
    pub references: Option<ForeignKeyTarget>,
    /// Expression of a generated column.
    pub generation_expression: Option<String>,
}

impl ColumnMetadata {
    /// Reads a row of the dialect's column query.
    ///
    /// Returns `None` when the row lacks an ordinal position or a type.
    #[must_use]
    pub fn from_row(table: &str, name: &str, row: &MetaRow) -> Option<Self> {
        let references = match (row.get_non_empty(6), row.get_non_empty(7)) {
            (Some(table), Some(column)) => Some(ForeignKeyTarget {
                table: table.to_string(),
                column: column.to_string(),
            }),
            _ => None,
        };
        Some(Self {
            table: table.to_string(),
            name: name.to_string(),
            ordinal_position: row.get_u32(0)?,
            default: row.get(1).map(str::to_string),
            extra: row.get(2).map(ColumnExtra::parse).unwrap_or_default(),
            primary_key: row.get(3) == Some("PRI"),
            nullable: row.get(4).is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            data_type: row.get_non_empty(5)?.to_string(),
            references,
            generation_expression: row.get_non_empty(8).map(str::to_string),
        })
    }

    /// Ordinal of the column this one follows, if any.
    #[must_use]
    pub fn predecessor_ordinal(&self) -> Option<u32> {
        self.ordinal_position.checked_sub(1).filter(|&p| p > 0)
    }

    /// Generates the column definition (everything after `ADD COLUMN`).
    #[must_use]
    pub fn definition(&self, dialect: &dyn CatalogDialect) -> String {
        let mut parts = vec![dialect.ident(&self.name), self.data_type.clone()];

        let generated = match (self.extra.generated, &self.generation_expression) {
            (Some(storage), Some(expr)) => Some((storage, expr)),
            _ => None,
        };
        if let Some((storage, expr)) = generated {
            let storage = match storage {
                GeneratedStorage::Virtual => "VIRTUAL",
                GeneratedStorage::Stored => "STORED",
            };
            parts.push(format!("GENERATED ALWAYS AS ({expr}) {storage}"));
        }

        parts.push(if self.nullable { "NULL" } else { "NOT NULL" }.to_string());

        if generated.is_none()
            && let Some(default) = &self.default
        {
            let value =
                dialect.default_value(default, &self.data_type, self.extra.default_generated);
            parts.push(format!("DEFAULT {value}"));
        }

        parts.extend(self.extra.clauses());

        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }

        if let Some(target) = &self.references {
            parts.push(format!(
                "REFERENCES {}({})",
                dialect.ident(&target.table),
                dialect.ident(&target.column)
            ));
        }

        parts.join(" ")
    }

    /// Generates the full `ALTER TABLE ... ADD COLUMN ...;` statement.
    #[must_use]
    pub fn add_column_sql(
        &self,
        dialect: &dyn CatalogDialect,
        position: Option<&ColumnPosition>,
    ) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            dialect.ident(&self.table),
            self.definition(dialect)
        );
        match position {
            Some(ColumnPosition::First) => sql.push_str(" FIRST"),
            Some(ColumnPosition::After(name)) => {
                sql.push_str(" AFTER ");
                sql.push_str(&dialect.ident(name));
            }
            None => {}
        }
        sql.push(';');
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    fn row(cells: [Option<&str>; 9]) -> MetaRow {
        MetaRow::new(cells.iter().map(|c| c.map(str::to_string)).collect())
    }

    fn email_column() -> ColumnMetadata {
        ColumnMetadata::from_row(
            "users",
            "email",
            &row([
                Some("3"),
                None,
                Some(""),
                Some(""),
                Some("YES"),
                Some("varchar(255)"),
                None,
                None,
                Some(""),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_extra_flags() {
        let extra = ColumnExtra::parse("DEFAULT_GENERATED on update CURRENT_TIMESTAMP");
        assert!(extra.default_generated);
        assert_eq!(extra.on_update.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(extra.other.is_empty());

        let extra = ColumnExtra::parse("auto_increment");
        assert!(extra.auto_increment);

        let extra = ColumnExtra::parse("VIRTUAL GENERATED INVISIBLE");
        assert_eq!(extra.generated, Some(GeneratedStorage::Virtual));
        assert!(extra.invisible);

        let extra = ColumnExtra::parse("IDENTITY BY DEFAULT");
        assert_eq!(extra.identity, Some(Identity::ByDefault));

        let extra = ColumnExtra::parse("SOMETHING new");
        assert_eq!(extra.other, vec!["SOMETHING".to_string(), "new".to_string()]);
    }

    #[test]
    fn test_default_generated_is_never_rendered() {
        let mut column = email_column();
        column.data_type = "timestamp".into();
        column.default = Some("CURRENT_TIMESTAMP".into());
        column.extra = ColumnExtra::parse("DEFAULT_GENERATED");

        let sql = column.add_column_sql(&MySqlDialect, Some(&ColumnPosition::First));
        assert_eq!(
            sql,
            "ALTER TABLE users ADD COLUMN email timestamp NULL DEFAULT CURRENT_TIMESTAMP FIRST;"
        );
    }

    #[test]
    fn test_minimal_column_has_no_whitespace_runs() {
        let sql = email_column().add_column_sql(
            &MySqlDialect,
            Some(&ColumnPosition::After("name".into())),
        );
        assert_eq!(
            sql,
            "ALTER TABLE users ADD COLUMN email varchar(255) NULL AFTER name;"
        );
        assert!(!sql.contains("  "));
    }

    #[test]
    fn test_full_column() {
        let column = ColumnMetadata::from_row(
            "orders",
            "user_id",
            &row([
                Some("2"),
                Some("0"),
                Some("auto_increment"),
                Some("PRI"),
                Some("NO"),
                Some("bigint unsigned"),
                Some("users"),
                Some("id"),
                None,
            ]),
        )
        .unwrap();

        assert_eq!(column.predecessor_ordinal(), Some(1));
        assert_eq!(
            column.add_column_sql(&MySqlDialect, Some(&ColumnPosition::After("id".into()))),
            "ALTER TABLE orders ADD COLUMN user_id bigint unsigned NOT NULL DEFAULT 0 \
             AUTO_INCREMENT PRIMARY KEY REFERENCES users(id) AFTER id;"
        );
    }

    #[test]
    fn test_generated_column() {
        let column = ColumnMetadata::from_row(
            "users",
            "full_name",
            &row([
                Some("4"),
                None,
                Some("STORED GENERATED"),
                Some(""),
                Some("YES"),
                Some("varchar(511)"),
                None,
                None,
                Some("concat(`first`,' ',`last`)"),
            ]),
        )
        .unwrap();
        assert_eq!(
            column.definition(&MySqlDialect),
            "full_name varchar(511) GENERATED ALWAYS AS (concat(`first`,' ',`last`)) STORED NULL"
        );
    }

    #[test]
    fn test_postgres_identity_without_position() {
        let column = ColumnMetadata::from_row(
            "users",
            "id",
            &row([
                Some("1"),
                None,
                Some("IDENTITY ALWAYS"),
                Some("PRI"),
                Some("NO"),
                Some("bigint"),
                None,
                None,
                None,
            ]),
        )
        .unwrap();
        assert_eq!(column.predecessor_ordinal(), None);
        assert_eq!(
            column.add_column_sql(&PostgresDialect, None),
            "ALTER TABLE users ADD COLUMN id bigint NOT NULL GENERATED ALWAYS AS IDENTITY PRIMARY KEY;"
        );
    }

    #[test]
    fn test_empty_string_default() {
        let mut column = email_column();
        column.default = Some(String::new());
        assert_eq!(
            column.definition(&MySqlDialect),
            "email varchar(255) NULL DEFAULT ''"
        );
    }

    #[test]
    fn test_string_and_temporal_literals_are_quoted() {
        let mut column = email_column();
        column.name = "status".into();
        column.data_type = "varchar(20)".into();
        column.nullable = false;
        column.default = Some("active".into());
        assert_eq!(
            column.add_column_sql(&MySqlDialect, Some(&ColumnPosition::After("id".into()))),
            "ALTER TABLE users ADD COLUMN status varchar(20) NOT NULL DEFAULT 'active' AFTER id;"
        );

        column.default = Some("it's a\\b".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT 'it''s a\\\\b'"));

        column.data_type = "enum('draft','sent')".into();
        column.default = Some("draft".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT 'draft'"));

        column.data_type = "date".into();
        column.default = Some("2020-01-01".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT '2020-01-01'"));

        column.data_type = "varchar(20)".into();
        column.default = Some("'active'".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT 'active'"));
    }

    #[test]
    fn test_expression_defaults_are_parenthesized() {
        let mut column = email_column();
        column.name = "token".into();
        column.data_type = "char(36)".into();
        column.default = Some("uuid()".into());
        column.extra = ColumnExtra::parse("DEFAULT_GENERATED");
        assert_eq!(
            column.definition(&MySqlDialect),
            "token char(36) NULL DEFAULT (uuid())"
        );

        column.data_type = "datetime(3)".into();
        column.default = Some("CURRENT_TIMESTAMP(3)".into());
        assert_eq!(
            column.definition(&MySqlDialect),
            "token datetime(3) NULL DEFAULT CURRENT_TIMESTAMP(3)"
        );

        column.extra = ColumnExtra::default();
        column.data_type = "timestamp".into();
        column.default = Some("current_timestamp()".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT current_timestamp()"));
    }

    #[test]
    fn test_numeric_and_postgres_defaults_are_verbatim() {
        let mut column = email_column();
        column.data_type = "decimal(10,2)".into();
        column.default = Some("0.00".into());
        assert!(column.definition(&MySqlDialect).ends_with("DEFAULT 0.00"));

        column.data_type = "character varying(20)".into();
        column.default = Some("'active'::character varying".into());
        assert!(
            column
                .definition(&PostgresDialect)
                .ends_with("DEFAULT 'active'::character varying")
        );
    }

    #[test]
    fn test_row_without_type_is_rejected() {
        let r = row([Some("1"), None, None, None, Some("NO"), None, None, None, None]);
        assert!(ColumnMetadata::from_row("t", "c", &r).is_none());
    }
}
