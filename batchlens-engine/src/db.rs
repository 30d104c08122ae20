//! Backend-specific pools and connections
//!
//! Every monitored database is one of the backends sqlx can drive. Pools and
//! connections are wrapped in enums so the rest of the engine handles them
//! uniformly; statements are dispatched to the matching variant by the
//! `fetch_rows!` and `fetch_scalar!` macros.

use batchlens_core::domain::datasource::{DataSourceConfig, DatabaseKind};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, MySql, MySqlConnection, MySqlPool, PgConnection, PgPool, Postgres};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;

use crate::config::PoolSettings;
use crate::error::{EngineError, Result};
use crate::query::Dialect;

/// Connection pool for one data source
#[derive(Debug, Clone)]
pub enum BatchPool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl BatchPool {
    pub fn dialect(&self) -> Dialect {
        match self {
            BatchPool::Postgres(_) => Dialect::Postgres,
            BatchPool::MySql(_) => Dialect::MySql,
            BatchPool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Take a connection from the pool, opening one if none is idle
    pub async fn acquire(&self) -> Result<BatchConnection> {
        let conn = match self {
            BatchPool::Postgres(pool) => pool.acquire().await.map(BatchConnection::Postgres),
            BatchPool::MySql(pool) => pool.acquire().await.map(BatchConnection::MySql),
            BatchPool::Sqlite(pool) => pool.acquire().await.map(BatchConnection::Sqlite),
        };
        conn.map_err(EngineError::Connection)
    }

    /// Close every connection; waits for checked-out connections to return
    pub async fn close(&self) {
        match self {
            BatchPool::Postgres(pool) => pool.close().await,
            BatchPool::MySql(pool) => pool.close().await,
            BatchPool::Sqlite(pool) => pool.close().await,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            BatchPool::Postgres(pool) => pool.is_closed(),
            BatchPool::MySql(pool) => pool.is_closed(),
            BatchPool::Sqlite(pool) => pool.is_closed(),
        }
    }
}

/// Connection checked out of a [`BatchPool`]; returned to it on drop
#[derive(Debug)]
pub enum BatchConnection {
    Postgres(PoolConnection<Postgres>),
    MySql(PoolConnection<MySql>),
    Sqlite(PoolConnection<Sqlite>),
}

impl BatchConnection {
    pub fn dialect(&self) -> Dialect {
        match self {
            BatchConnection::Postgres(_) => Dialect::Postgres,
            BatchConnection::MySql(_) => Dialect::MySql,
            BatchConnection::Sqlite(_) => Dialect::Sqlite,
        }
    }
}

/// Backend selected by the configuration's driver identifier
pub fn backend_for(config: &DataSourceConfig) -> Result<DatabaseKind> {
    let driver = config.effective_driver();
    DatabaseKind::from_driver(driver).ok_or_else(|| EngineError::UnsupportedDriver(driver.to_string()))
}

/// Build a pool that opens connections on first use
///
/// Must be called from within a tokio runtime.
pub fn create_pool(config: &DataSourceConfig, settings: &PoolSettings) -> Result<BatchPool> {
    let pool = match backend_for(config)? {
        DatabaseKind::PostgreSql => BatchPool::Postgres(
            PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_idle)
                .acquire_timeout(settings.connect_timeout)
                .idle_timeout(settings.idle_timeout)
                .max_lifetime(settings.max_lifetime)
                .connect_lazy_with(pg_options(config)?),
        ),
        DatabaseKind::MySql => BatchPool::MySql(
            MySqlPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_idle)
                .acquire_timeout(settings.connect_timeout)
                .idle_timeout(settings.idle_timeout)
                .max_lifetime(settings.max_lifetime)
                .connect_lazy_with(mysql_options(config)?),
        ),
        DatabaseKind::Sqlite => BatchPool::Sqlite(
            SqlitePoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_idle)
                .acquire_timeout(settings.connect_timeout)
                .idle_timeout(settings.idle_timeout)
                .max_lifetime(settings.max_lifetime)
                .connect_lazy_with(sqlite_options(config)?),
        ),
    };

    Ok(pool)
}

/// Open one connection outside any pool, ping it and close it
pub async fn ping(config: &DataSourceConfig) -> Result<()> {
    match backend_for(config)? {
        DatabaseKind::PostgreSql => {
            let mut conn = PgConnection::connect_with(&pg_options(config)?)
                .await
                .map_err(EngineError::Connection)?;
            conn.ping().await.map_err(EngineError::Connection)?;
            conn.close().await.map_err(EngineError::Connection)
        }
        DatabaseKind::MySql => {
            let mut conn = MySqlConnection::connect_with(&mysql_options(config)?)
                .await
                .map_err(EngineError::Connection)?;
            conn.ping().await.map_err(EngineError::Connection)?;
            conn.close().await.map_err(EngineError::Connection)
        }
        DatabaseKind::Sqlite => {
            let mut conn = SqliteConnection::connect_with(&sqlite_options(config)?)
                .await
                .map_err(EngineError::Connection)?;
            conn.ping().await.map_err(EngineError::Connection)?;
            conn.close().await.map_err(EngineError::Connection)
        }
    }
}

// =============================================================================
// Connect Options
// =============================================================================

/// Accept JDBC-style URLs as pasted from an application's configuration
fn connection_url(config: &DataSourceConfig) -> &str {
    let url = config.url.trim();
    url.strip_prefix("jdbc:").unwrap_or(url)
}

fn pg_options(config: &DataSourceConfig) -> Result<PgConnectOptions> {
    let mut options =
        PgConnectOptions::from_str(connection_url(config)).map_err(EngineError::Connection)?;
    if !config.username.is_empty() {
        options = options.username(&config.username);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    Ok(options)
}

fn mysql_options(config: &DataSourceConfig) -> Result<MySqlConnectOptions> {
    let mut options =
        MySqlConnectOptions::from_str(connection_url(config)).map_err(EngineError::Connection)?;
    if !config.username.is_empty() {
        options = options.username(&config.username);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    Ok(options)
}

/// SQLite files are never created; a missing file is a connection failure
fn sqlite_options(config: &DataSourceConfig) -> Result<SqliteConnectOptions> {
    SqliteConnectOptions::from_str(connection_url(config)).map_err(EngineError::Connection)
}

// =============================================================================
// Statement Dispatch
// =============================================================================

/// Bind every [`SqlParam`](crate::query::SqlParam) of a query in order
macro_rules! bind_params {
    ($stmt:expr, $query:expr) => {{
        let mut stmt = $stmt;
        for param in $query.params() {
            stmt = match param {
                $crate::query::SqlParam::Text(v) => stmt.bind(v.clone()),
                $crate::query::SqlParam::Int(v) => stmt.bind(*v),
                $crate::query::SqlParam::Timestamp(v) => stmt.bind(*v),
            };
        }
        stmt
    }};
}

/// Run a [`SqlQuery`](crate::query::SqlQuery) mapping rows to `$row`
///
/// `$method` is the sqlx terminal (`fetch_all`, `fetch_optional`, `fetch_one`).
macro_rules! fetch_rows {
    ($conn:expr, $query:expr, $row:ty, $method:ident) => {
        match $conn {
            $crate::db::BatchConnection::Postgres(conn) => {
                $crate::db::bind_params!(sqlx::query_as::<_, $row>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
            $crate::db::BatchConnection::MySql(conn) => {
                $crate::db::bind_params!(sqlx::query_as::<_, $row>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
            $crate::db::BatchConnection::Sqlite(conn) => {
                $crate::db::bind_params!(sqlx::query_as::<_, $row>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
        }
    };
}

/// Run a [`SqlQuery`](crate::query::SqlQuery) returning a single column
macro_rules! fetch_scalar {
    ($conn:expr, $query:expr, $value:ty, $method:ident) => {
        match $conn {
            $crate::db::BatchConnection::Postgres(conn) => {
                $crate::db::bind_params!(sqlx::query_scalar::<_, $value>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
            $crate::db::BatchConnection::MySql(conn) => {
                $crate::db::bind_params!(sqlx::query_scalar::<_, $value>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
            $crate::db::BatchConnection::Sqlite(conn) => {
                $crate::db::bind_params!(sqlx::query_scalar::<_, $value>($query.sql()), $query)
                    .$method(&mut **conn)
                    .await
            }
        }
    };
}

pub(crate) use bind_params;
pub(crate) use fetch_rows;
pub(crate) use fetch_scalar;
