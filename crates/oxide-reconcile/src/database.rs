//! sqlx-backed connections.
//!
//! [`DatabaseConnection`] wraps a single-connection pool for the profile's
//! engine and implements [`Connection`] on top of it. Opening, pinging and
//! closing are done by the caller; the engine only calls
//! [`Connection::fetch`].

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ColumnIndex, Connection as _, Decode, MySql, Postgres, Row, Type};
use tracing::{debug, info};

use crate::connection::{Connection, MetaQuery, MetaRow};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::profile::ConnectionProfile;

enum Pool {
    MySql(MySqlPool),
    Postgres(PgPool),
}

/// A live connection opened from a [`ConnectionProfile`].
pub struct DatabaseConnection {
    pool: Pool,
    dialect: Dialect,
    database: String,
}

impl DatabaseConnection {
    /// Opens a connection.
    pub async fn connect(profile: &ConnectionProfile) -> Result<Self> {
        let dialect = profile.engine.dialect();
        let pool = match dialect {
            Dialect::MySql => {
                let options = MySqlConnectOptions::new()
                    .host(&profile.host)
                    .port(profile.port)
                    .username(&profile.user)
                    .password(&profile.password)
                    .database(&profile.database);
                Pool::MySql(
                    MySqlPoolOptions::new()
                        .max_connections(1)
                        .connect_with(options)
                        .await?,
                )
            }
            Dialect::Postgres => {
                let options = PgConnectOptions::new()
                    .host(&profile.host)
                    .port(profile.port)
                    .username(&profile.user)
                    .password(&profile.password)
                    .database(&profile.database);
                Pool::Postgres(
                    PgPoolOptions::new()
                        .max_connections(1)
                        .connect_with(options)
                        .await?,
                )
            }
        };

        info!(
            profile = %profile.name,
            engine = %profile.engine,
            host = %profile.host,
            database = %profile.database,
            "Connected"
        );
        Ok(Self {
            pool,
            dialect,
            database: profile.database.clone(),
        })
    }

    /// Checks that the server answers.
    pub async fn ping(&self) -> Result<()> {
        match &self.pool {
            Pool::MySql(pool) => {
                let mut conn = pool.acquire().await?;
                conn.ping().await?;
            }
            Pool::Postgres(pool) => {
                let mut conn = pool.acquire().await?;
                conn.ping().await?;
            }
        }
        Ok(())
    }

    /// Closes the pool.
    pub async fn close(&self) {
        match &self.pool {
            Pool::MySql(pool) => pool.close().await,
            Pool::Postgres(pool) => pool.close().await,
        }
    }
}

impl Connection for DatabaseConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn fetch(&self, query: &MetaQuery) -> std::result::Result<Vec<MetaRow>, sqlx::Error> {
        debug!(sql = %query.sql, params = ?query.params, "Fetching");
        // SHOW CREATE ... cannot be prepared, so parameterless queries go unprepared.
        match &self.pool {
            Pool::MySql(pool) => {
                let rows = if query.params.is_empty() {
                    sqlx::raw_sql(&query.sql).fetch_all(pool).await?
                } else {
                    let mut q = sqlx::query::<MySql>(&query.sql);
                    for param in &query.params {
                        q = q.bind(param.as_str());
                    }
                    q.fetch_all(pool).await?
                };
                Ok(rows.iter().map(meta_row).collect())
            }
            Pool::Postgres(pool) => {
                let rows = if query.params.is_empty() {
                    sqlx::raw_sql(&query.sql).fetch_all(pool).await?
                } else {
                    let mut q = sqlx::query::<Postgres>(&query.sql);
                    for param in &query.params {
                        q = q.bind(param.as_str());
                    }
                    q.fetch_all(pool).await?
                };
                Ok(rows.iter().map(meta_row).collect())
            }
        }
    }
}

fn meta_row<R>(row: &R) -> MetaRow
where
    R: Row,
    usize: ColumnIndex<R>,
    String: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
{
    MetaRow::new((0..row.len()).map(|i| cell(row, i)).collect())
}

/// Reads a cell as text, then as bytes, then as text without a type check
/// (domain types such as `sql_identifier`). Anything else reads as NULL.
fn cell<R>(row: &R, index: usize) -> Option<String>
where
    R: Row,
    usize: ColumnIndex<R>,
    String: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
{
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value;
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    }
    row.try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .flatten()
}
