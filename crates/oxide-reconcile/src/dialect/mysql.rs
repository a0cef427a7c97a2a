//! MySQL dialect (also used for MariaDB).
//!
//! Entities are scoped to the schema named after the connection's database.
//! Creation statements come from the server's own `SHOW CREATE ...` output.

use crate::connection::MetaQuery;
use crate::entity::{DiffEntry, EntityKind};

use super::{CatalogDialect, Reconstruction};

/// Reserved keywords of MySQL 8 (and the MariaDB additions).
const RESERVED_WORDS: &[&str] = &[
    "accessible", "add", "all", "alter", "analyze", "and", "as", "asc", "asensitive", "before",
    "between", "bigint", "binary", "blob", "both", "by", "call", "cascade", "case", "change",
    "char", "character", "check", "collate", "column", "condition", "constraint", "continue",
    "convert", "create", "cross", "cube", "cume_dist", "current_date", "current_role",
    "current_time", "current_timestamp", "current_user", "cursor", "database", "databases",
    "day_hour", "day_microsecond", "day_minute", "day_second", "dec", "decimal", "declare",
    "default", "delayed", "delete", "delete_domain_id", "dense_rank", "desc", "describe",
    "deterministic", "distinct", "distinctrow", "div", "do_domain_ids", "double", "drop", "dual",
    "each", "else", "elseif", "empty", "enclosed", "escaped", "except", "exists", "exit",
    "explain", "false", "fetch", "first_value", "float", "float4", "float8", "for", "force",
    "foreign", "from", "fulltext", "function", "general", "generated", "get", "grant", "group",
    "grouping", "groups", "having", "high_priority", "hour_microsecond", "hour_minute",
    "hour_second", "if", "ignore", "ignore_domain_ids", "ignore_server_ids", "in", "index",
    "infile", "inner", "inout", "insensitive", "insert", "int", "int1", "int2", "int3", "int4",
    "int8", "integer", "intersect", "interval", "into", "io_after_gtids", "io_before_gtids", "is",
    "iterate", "join", "json_table", "key", "keys", "kill", "lag", "last_value", "lateral", "lead",
    "leading", "leave", "left", "like", "limit", "linear", "lines", "load", "localtime",
    "localtimestamp", "lock", "long", "longblob", "longtext", "loop", "low_priority", "manual",
    "master_bind", "master_heartbeat_period", "master_ssl_verify_server_cert", "match",
    "maxvalue", "mediumblob", "mediumint", "mediumtext", "middleint", "minute_microsecond",
    "minute_second", "mod", "modifies", "natural", "no_write_to_binlog", "not", "nth_value",
    "ntile", "null", "numeric", "of", "offset", "on", "optimize", "optimizer_costs", "option",
    "optionally", "or", "order", "out", "outer", "outfile", "over", "page_checksum",
    "parallel", "parse_vcol_expr", "partition", "percent_rank", "position", "precision",
    "primary", "procedure", "purge", "qualify", "range", "rank", "read", "read_write", "reads",
    "real", "recursive", "ref_system_id", "references", "regexp", "release", "rename", "repeat",
    "replace", "require", "resignal", "restrict", "return", "returning", "revoke", "right",
    "rlike", "row", "row_number", "rows", "schema", "schemas", "second_microsecond", "select",
    "sensitive", "separator", "set", "show", "signal", "slow", "smallint", "spatial", "specific",
    "sql", "sql_big_result", "sql_calc_found_rows", "sql_small_result", "sqlexception",
    "sqlstate", "sqlwarning", "ssl", "starting", "stats_auto_recalc", "stats_persistent",
    "stats_sample_pages", "stored", "straight_join", "system", "table", "terminated", "then",
    "tinyblob", "tinyint", "tinytext", "to", "trailing", "trigger", "true", "undo", "union",
    "unique", "unlock", "unsigned", "update", "usage", "use", "using", "utc_date", "utc_time",
    "utc_timestamp", "values", "varbinary", "varchar", "varcharacter", "varying", "virtual",
    "when", "where", "while", "window", "with", "write", "xor", "year_month", "zerofill",
];

/// Returns whether `value` is a `CURRENT_TIMESTAMP`-style default, which is
/// accepted without parentheses.
fn is_timestamp_keyword(value: &str) -> bool {
    let (word, args) = match value.split_once('(') {
        Some((word, rest)) => (word, Some(rest)),
        None => (value, None),
    };
    let keyword = ["current_timestamp", "localtime", "localtimestamp", "now"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k));
    keyword
        && args.is_none_or(|rest| {
            rest.strip_suffix(')')
                .is_some_and(|fsp| fsp.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Lowercase type name without length, precision or attributes.
fn base_type(data_type: &str) -> String {
    data_type
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn is_temporal(base: &str) -> bool {
    matches!(base, "date" | "time" | "datetime" | "timestamp")
}

/// Returns whether literal defaults of this type are reported unquoted.
fn takes_quoted_default(base: &str) -> bool {
    is_temporal(base)
        || matches!(
            base,
            "char"
                | "varchar"
                | "binary"
                | "varbinary"
                | "tinytext"
                | "text"
                | "mediumtext"
                | "longtext"
                | "tinyblob"
                | "blob"
                | "mediumblob"
                | "longblob"
                | "json"
                | "enum"
                | "set"
                | "year"
        )
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// MySQL catalog dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Routine listing for procedures and functions.
    fn routines_query(routine_type: &str, database: &str) -> MetaQuery {
        MetaQuery::new(format!(
            "SELECT ROUTINE_NAME FROM information_schema.ROUTINES \
             WHERE ROUTINE_SCHEMA = ? AND ROUTINE_TYPE = '{routine_type}' \
             ORDER BY ROUTINE_NAME"
        ))
        .bind(database)
    }
}

impl CatalogDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn list_query(&self, kind: EntityKind, database: &str) -> Option<MetaQuery> {
        let query = match kind {
            // Plain SHOW TABLES would include views.
            EntityKind::Tables => {
                MetaQuery::new("SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'")
            }
            EntityKind::Columns => MetaQuery::new(
                "SELECT C.COLUMN_NAME, C.TABLE_NAME \
                 FROM information_schema.COLUMNS C \
                 JOIN information_schema.TABLES T \
                   ON T.TABLE_SCHEMA = C.TABLE_SCHEMA AND T.TABLE_NAME = C.TABLE_NAME \
                 WHERE C.TABLE_SCHEMA = ? AND T.TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY C.TABLE_NAME, C.ORDINAL_POSITION",
            )
            .bind(database),
            EntityKind::Views => MetaQuery::new(
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'VIEW' \
                 ORDER BY TABLE_NAME",
            )
            .bind(database),
            EntityKind::Procedures => Self::routines_query("PROCEDURE", database),
            EntityKind::Functions => Self::routines_query("FUNCTION", database),
            EntityKind::Triggers => MetaQuery::new(
                "SELECT TRIGGER_NAME, EVENT_OBJECT_TABLE FROM information_schema.TRIGGERS \
                 WHERE TRIGGER_SCHEMA = ? \
                 ORDER BY TRIGGER_NAME",
            )
            .bind(database),
        };
        Some(query)
    }

    fn reconstruct_query(
        &self,
        kind: EntityKind,
        name: &str,
        _database: &str,
    ) -> Option<Reconstruction> {
        // Statement column of each SHOW CREATE result set.
        let column = match kind {
            EntityKind::Tables | EntityKind::Views => 1,
            EntityKind::Procedures | EntityKind::Functions | EntityKind::Triggers => 2,
            EntityKind::Columns => return None,
        };
        Some(Reconstruction {
            query: MetaQuery::new(format!(
                "SHOW CREATE {} {}",
                kind.keyword(),
                self.quote_identifier(name)
            )),
            column,
        })
    }

    fn column_query(&self, database: &str, table: &str, column: &str) -> Option<MetaQuery> {
        Some(
            MetaQuery::new(
                "SELECT \
                    CAST(C.ORDINAL_POSITION AS CHAR), \
                    C.COLUMN_DEFAULT, \
                    C.EXTRA, \
                    C.COLUMN_KEY, \
                    C.IS_NULLABLE, \
                    C.COLUMN_TYPE, \
                    KCU.REFERENCED_TABLE_NAME, \
                    KCU.REFERENCED_COLUMN_NAME, \
                    C.GENERATION_EXPRESSION \
                 FROM information_schema.COLUMNS C \
                 LEFT JOIN information_schema.KEY_COLUMN_USAGE KCU \
                   ON C.TABLE_SCHEMA = KCU.TABLE_SCHEMA \
                  AND C.TABLE_NAME = KCU.TABLE_NAME \
                  AND C.COLUMN_NAME = KCU.COLUMN_NAME \
                  AND KCU.REFERENCED_TABLE_NAME IS NOT NULL \
                 WHERE C.TABLE_SCHEMA = ? AND C.TABLE_NAME = ? AND C.COLUMN_NAME = ?",
            )
            .bind(database)
            .bind(table)
            .bind(column),
        )
    }

    fn positions_columns(&self) -> bool {
        true
    }

    fn column_at_query(&self, database: &str, table: &str, ordinal: u32) -> Option<MetaQuery> {
        Some(
            MetaQuery::new(
                "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND ORDINAL_POSITION = ?",
            )
            .bind(database)
            .bind(table)
            .bind(ordinal.to_string()),
        )
    }

    fn is_plain_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }

    fn is_reserved(&self, name: &str) -> bool {
        RESERVED_WORDS.contains(&name.to_ascii_lowercase().as_str())
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn default_value(&self, value: &str, data_type: &str, expression: bool) -> String {
        let base = base_type(data_type);
        if (expression || is_temporal(&base)) && is_timestamp_keyword(value) {
            return value.to_string();
        }
        if expression {
            return if value.starts_with('(') {
                value.to_string()
            } else {
                format!("({value})")
            };
        }
        // MariaDB reports string defaults already quoted.
        let quoted = value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'');
        if value.is_empty() || (takes_quoted_default(&base) && !quoted) {
            quote_literal(value)
        } else {
            value.to_string()
        }
    }

    fn drop_statement(&self, entry: &DiffEntry) -> String {
        match (entry.kind, &entry.parent) {
            (EntityKind::Columns, Some(table)) => format!(
                "ALTER TABLE {} DROP COLUMN {};",
                self.ident(table),
                self.ident(&entry.name)
            ),
            (kind, _) => format!("DROP {} IF EXISTS {};", kind.keyword(), self.ident(&entry.name)),
        }
    }
}
