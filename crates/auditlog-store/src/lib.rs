//! Audit event store.
//!
//! An append-only, domain-partitioned log of [`AuditEvent`]s backed by the
//! `audit_events` table. The query side returns pages addressed by offset
//! into a domain's insertion-ordered sequence, optionally narrowed to a single
//! actor. The write side exists for producers and tests; it never mutates a
//! stored event.
//!
//! # Usage
//!
//! ```rust,ignore
//! use auditlog_store::{query_events, save_event};
//! use auditlog_types::{AuditEvent, PageRequest};
//!
//! save_event(&conn, &AuditEvent::new("acme", "alice", "STANDARD_LOGIN", chrono::Utc::now()))?;
//! let first = query_events(&conn, "acme", PageRequest::first(50).unwrap())?;
//! ```
//!
//! [`AuditEvent`]: auditlog_types::AuditEvent

mod error;
mod store;

pub use error::StoreError;
pub use store::{
    count_events, delete_all_by_domain, query_events, query_events_by_actor, save_event,
};
