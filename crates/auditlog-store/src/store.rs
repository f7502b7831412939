//! Persistence operations for the audit event log.
//!
//! Events live in the `audit_events` table. Within a domain they are ordered
//! by `seq`, the insertion sequence, and every read here addresses that order
//! by offset. A new row always gets a larger `seq` than every existing one,
//! so an offset keeps pointing at the same event while other writers append,
//! whatever `occurred_at` the new events carry.

use auditlog_types::{AuditEvent, PageRequest};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

use crate::error::StoreError;

const SELECT_COLUMNS: &str = "SELECT id, domain, actor_user_id, user_login, event_type, success,
        links_json, params_json, occurred_at
 FROM audit_events";

/// Years that render as a four-digit RFC 3339 year.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Persists an event.
///
/// Saving an event whose `id` is already stored is a no-op; the method then
/// returns `Ok(false)`. Stored events are never overwritten.
///
/// # Errors
///
/// Returns `StoreError::InvalidEvent` if the id, domain, actor or type is
/// empty or the timestamp falls outside years 0000-9999,
/// `StoreError::Serialization` if the links or params cannot be encoded, and
/// `StoreError::Database` on SQL failure.
pub fn save_event(conn: &Connection, event: &AuditEvent) -> Result<bool, StoreError> {
    if event.id.is_empty() {
        return Err(StoreError::InvalidEvent("id must not be empty".to_string()));
    }
    if event.domain.is_empty() {
        return Err(StoreError::InvalidEvent("domain must not be empty".to_string()));
    }
    if event.actor_user_id.is_empty() {
        return Err(StoreError::InvalidEvent(
            "actor user id must not be empty".to_string(),
        ));
    }
    if event.event_type.is_empty() {
        return Err(StoreError::InvalidEvent("type must not be empty".to_string()));
    }
    if !STORABLE_YEARS.contains(&event.occurred_at.year()) {
        return Err(StoreError::InvalidEvent(format!(
            "occurred_at {} is outside the storable range",
            event.occurred_at
        )));
    }

    let links_json = serde_json::to_string(&event.links)?;
    let params_json = serde_json::to_string(&event.params)?;

    let inserted = conn.execute(
        "INSERT INTO audit_events
             (id, domain, actor_user_id, user_login, event_type, success,
              links_json, params_json, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO NOTHING",
        params![
            event.id,
            event.domain,
            event.actor_user_id,
            event.user_login,
            event.event_type,
            event.success,
            links_json,
            params_json,
            format_timestamp(&event.occurred_at),
        ],
    )?;

    if inserted == 0 {
        tracing::debug!(id = %event.id, domain = %event.domain, "audit event already stored, ignoring");
    }

    Ok(inserted > 0)
}

/// Returns one page of a domain's events, oldest first.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure, or `StoreError::Timestamp`
/// / `StoreError::Serialization` if a stored row is corrupt.
pub fn query_events(
    conn: &Connection,
    domain: &str,
    page: PageRequest,
) -> Result<Vec<AuditEvent>, StoreError> {
    let sql = format!(
        "{SELECT_COLUMNS}
         WHERE domain = ?1
         ORDER BY seq ASC
         LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![domain, i64::from(page.limit), sql_offset(page)],
        read_row,
    )?;
    collect_events(rows)
}

/// Returns one page of the events a single actor caused within a domain.
///
/// Offsets count only that actor's events.
///
/// # Errors
///
/// Same as [`query_events`].
pub fn query_events_by_actor(
    conn: &Connection,
    domain: &str,
    actor_user_id: &str,
    page: PageRequest,
) -> Result<Vec<AuditEvent>, StoreError> {
    let sql = format!(
        "{SELECT_COLUMNS}
         WHERE domain = ?1 AND actor_user_id = ?2
         ORDER BY seq ASC
         LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![domain, actor_user_id, i64::from(page.limit), sql_offset(page)],
        read_row,
    )?;
    collect_events(rows)
}

/// Counts a domain's events, optionally only those of one actor.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn count_events(
    conn: &Connection,
    domain: &str,
    actor_user_id: Option<&str>,
) -> Result<u64, StoreError> {
    let count: i64 = match actor_user_id {
        Some(actor) => conn.query_row(
            "SELECT COUNT(*) FROM audit_events WHERE domain = ?1 AND actor_user_id = ?2",
            params![domain, actor],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM audit_events WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )?,
    };
    Ok(count.max(0) as u64)
}

/// Removes every event of a domain. Administrative reset only.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn delete_all_by_domain(conn: &Connection, domain: &str) -> Result<usize, StoreError> {
    let deleted = conn.execute("DELETE FROM audit_events WHERE domain = ?1", params![domain])?;
    tracing::info!(domain, deleted, "deleted all audit events for domain");
    Ok(deleted)
}

/// Fixed-width RFC 3339 with microseconds and a trailing `Z`.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn sql_offset(page: PageRequest) -> i64 {
    i64::try_from(page.offset).unwrap_or(i64::MAX)
}

/// A row as stored, before the JSON and timestamp columns are decoded.
struct RawEvent {
    id: String,
    domain: String,
    actor_user_id: String,
    user_login: String,
    event_type: String,
    success: bool,
    links_json: String,
    params_json: String,
    occurred_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        domain: row.get(1)?,
        actor_user_id: row.get(2)?,
        user_login: row.get(3)?,
        event_type: row.get(4)?,
        success: row.get(5)?,
        links_json: row.get(6)?,
        params_json: row.get(7)?,
        occurred_at: row.get(8)?,
    })
}

fn collect_events(
    rows: impl Iterator<Item = rusqlite::Result<RawEvent>>,
) -> Result<Vec<AuditEvent>, StoreError> {
    let mut events = Vec::new();
    for row in rows {
        let raw = row?;
        let links: BTreeMap<String, String> = serde_json::from_str(&raw.links_json)?;
        let params: BTreeMap<String, String> = serde_json::from_str(&raw.params_json)?;
        events.push(AuditEvent {
            id: raw.id,
            domain: raw.domain,
            actor_user_id: raw.actor_user_id,
            user_login: raw.user_login,
            occurred_at: DateTime::parse_from_rfc3339(&raw.occurred_at)?.with_timezone(&Utc),
            event_type: raw.event_type,
            success: raw.success,
            links,
            params,
        });
    }
    Ok(events)
}
