//! Startup check that the audit schema is in the shape the feeds rely on.
//!
//! Paging by offset is only cheap and stable when the `(domain, seq)` indexes
//! exist; a database migrated by hand or restored from an old dump may lack
//! them. [`verify_schema`] runs after migrations and refuses to start on
//! anything missing.

use rusqlite::Connection;
use thiserror::Error;

/// Tables the service reads.
pub const REQUIRED_TABLES: &[&str] = &["audit_events", "directory_domains", "directory_users"];

/// Indexes backing the two feed queries.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_audit_events_domain_seq",
    "idx_audit_events_domain_actor_seq",
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required table '{0}' is missing")]
    MissingTable(&'static str),

    #[error("required index '{0}' is missing")]
    MissingIndex(&'static str),

    #[error("failed to inspect schema: {0}")]
    Query(#[from] rusqlite::Error),
}

fn object_exists(conn: &Connection, kind: &str, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2)",
        [kind, name],
        |row| row.get(0),
    )
}

/// Confirms every table and index the feeds need is present.
///
/// # Errors
///
/// Returns the first missing object, or `SchemaError::Query` if
/// `sqlite_master` cannot be read.
pub fn verify_schema(conn: &Connection) -> Result<(), SchemaError> {
    for &table in REQUIRED_TABLES {
        if !object_exists(conn, "table", table)? {
            return Err(SchemaError::MissingTable(table));
        }
    }
    for &index in REQUIRED_INDEXES {
        if !object_exists(conn, "index", index)? {
            return Err(SchemaError::MissingIndex(index));
        }
    }
    Ok(())
}
