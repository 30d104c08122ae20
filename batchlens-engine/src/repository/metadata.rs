//! Metadata Repository
//!
//! Catalog lookups used to check that a database actually carries the
//! batch metadata schema.

use crate::db::{BatchConnection, fetch_scalar};
use crate::query::{Dialect, SqlBuilder};

/// Names of the tables in the current schema that look like batch tables
///
/// Matching is a case-insensitive substring test on `batch`; the result
/// is sorted.
pub async fn list_batch_tables(conn: &mut BatchConnection) -> Result<Vec<String>, sqlx::Error> {
    let query = SqlBuilder::new(conn.dialect(), catalog_select(conn.dialect())).build();

    let names = fetch_scalar!(conn, query, String, fetch_all)?;
    Ok(batch_tables(names))
}

/// Catalog query listing base tables of the connection's default schema
fn catalog_select(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => {
            "SELECT CAST(table_name AS TEXT) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'"
        }
        Dialect::MySql => {
            "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'"
        }
        Dialect::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table'",
    }
}

fn batch_tables(names: Vec<String>) -> Vec<String> {
    let mut tables: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_ascii_lowercase().contains("batch"))
        .collect();
    tables.sort_by_key(|name| name.to_ascii_uppercase());
    tables
}
