//! Database layer for the audit log service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and a startup schema check. The audit event log
//! and the local directory tables are both created through versioned
//! migrations managed here.
//!
//! WAL mode matters for the query path: readers page through a domain's
//! events while writers append, and neither blocks the other.

mod migrations;
mod pool;
mod schema;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{verify_schema, SchemaError, REQUIRED_INDEXES, REQUIRED_TABLES};
