//! User/domain directory lookups.
//!
//! The directory is the source of truth for which domain a user belongs to
//! and who owns each domain. It hands out resource references such as
//! `/directory/domains/acme` rather than bare identifiers; [`resource_id`]
//! checks the kind of a reference and extracts its identifier.
//!
//! Lookups are blocking and must run inside `spawn_blocking`.

use auditlog_db::DbPool;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use thiserror::Error;

/// Path prefix of domain references.
pub const DOMAIN_REF_PREFIX: &str = "/directory/domains/";
/// Path prefix of user references.
pub const USER_REF_PREFIX: &str = "/directory/users/";

/// Errors raised when the directory itself cannot answer.
///
/// An unknown user or domain is not an error here; lookups return `None`.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No pooled connection was available.
    #[error("directory connection unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    /// The lookup query failed.
    #[error("directory query failed: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Read access to the user/domain directory.
pub trait Directory: Send + Sync {
    /// Returns a reference to the domain `user_id` belongs to.
    fn user_domain_ref(&self, user_id: &str) -> Result<Option<String>, DirectoryError>;

    /// Returns a reference to the user who owns `domain`.
    fn domain_owner_ref(&self, domain: &str) -> Result<Option<String>, DirectoryError>;
}

/// Builds the reference for a domain.
pub fn domain_ref(domain: &str) -> String {
    format!("{DOMAIN_REF_PREFIX}{domain}")
}

/// Builds the reference for a user.
pub fn user_ref(user_id: &str) -> String {
    format!("{USER_REF_PREFIX}{user_id}")
}

/// Returns the identifier of a reference of the given kind.
///
/// `prefix` is [`DOMAIN_REF_PREFIX`] or [`USER_REF_PREFIX`]. A reference of
/// the other kind, a bare identifier, or one with extra path segments yields
/// `None`, so a domain named like a user can never stand in for that user.
pub fn resource_id<'a>(reference: &'a str, prefix: &str) -> Option<&'a str> {
    let id = reference
        .trim()
        .strip_prefix(prefix)?
        .trim_end_matches('/');
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Directory backed by the local `directory_users` / `directory_domains` tables.
#[derive(Clone)]
pub struct SqliteDirectory {
    pool: DbPool,
}

impl SqliteDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Directory for SqliteDirectory {
    fn user_domain_ref(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
        let conn = self.pool.get()?;
        let domain_uri = conn
            .query_row(
                "SELECT domain_uri FROM directory_users WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(domain_uri)
    }

    fn domain_owner_ref(&self, domain: &str) -> Result<Option<String>, DirectoryError> {
        let conn = self.pool.get()?;
        let owner_uri = conn
            .query_row(
                "SELECT owner_uri FROM directory_domains WHERE domain = ?1",
                params![domain],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner_uri)
    }
}

/// Records (or replaces) a user's domain membership.
///
/// # Errors
///
/// Returns `DirectoryError::Database` on SQL failure.
pub fn upsert_user(conn: &Connection, user_id: &str, domain: &str) -> Result<(), DirectoryError> {
    conn.execute(
        "INSERT INTO directory_users (user_id, domain_uri) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET domain_uri = excluded.domain_uri",
        params![user_id, domain_ref(domain)],
    )?;
    Ok(())
}

/// Records (or replaces) a domain's owner.
///
/// # Errors
///
/// Returns `DirectoryError::Database` on SQL failure.
pub fn upsert_domain(
    conn: &Connection,
    domain: &str,
    owner_user_id: &str,
) -> Result<(), DirectoryError> {
    conn.execute(
        "INSERT INTO directory_domains (domain, owner_uri) VALUES (?1, ?2)
         ON CONFLICT(domain) DO UPDATE SET owner_uri = excluded.owner_uri",
        params![domain, user_ref(owner_user_id)],
    )?;
    Ok(())
}

/// Fixed in-memory directory, mainly for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<String, String>,
    owners: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `user_id` in `domain`.
    pub fn with_user(mut self, user_id: &str, domain: &str) -> Self {
        self.users.insert(user_id.to_string(), domain_ref(domain));
        self
    }

    /// Makes `owner_user_id` the owner of `domain`.
    pub fn with_domain(mut self, domain: &str, owner_user_id: &str) -> Self {
        self.owners.insert(domain.to_string(), user_ref(owner_user_id));
        self
    }
}

impl Directory for StaticDirectory {
    fn user_domain_ref(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self.users.get(user_id).cloned())
    }

    fn domain_owner_ref(&self, domain: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self.owners.get(domain).cloned())
    }
}
