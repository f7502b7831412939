//! Shared types for the audit log workspace.
//!
//! This crate holds the value types that cross crate boundaries: the
//! immutable [`AuditEvent`] record, the pagination window ([`PageRequest`])
//! and its result ([`Page`]), the per-request [`CallerContext`], and the
//! cursor codec that turns query-string parameters into page windows and
//! back into followable links.
//!
//! Nothing here touches the database or the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single immutable audit event.
///
/// Events are ordered within a domain by the order in which the store
/// received them. Producers stamp `occurred_at` so that it never decreases
/// along that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier assigned at creation.
    pub id: String,
    /// The tenant the event belongs to.
    pub domain: String,
    /// The user whose action produced the event.
    #[serde(rename = "userId")]
    pub actor_user_id: String,
    /// Login name of the actor at the time of the action.
    #[serde(rename = "userLogin")]
    pub user_login: String,
    /// When the action happened.
    #[serde(rename = "occurredAt")]
    pub occurred_at: DateTime<Utc>,
    /// Kind of action, e.g. `DATA_EXPORT` or `STANDARD_LOGIN`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Resources the action touched, keyed by role (`project`, `dashboard`).
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Free-form action parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl AuditEvent {
    /// Creates a successful event with a freshly generated identifier.
    ///
    /// The login defaults to the actor's user id.
    pub fn new(
        domain: impl Into<String>,
        actor_user_id: impl Into<String>,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let actor_user_id = actor_user_id.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain: domain.into(),
            user_login: actor_user_id.clone(),
            actor_user_id,
            occurred_at,
            event_type: event_type.into(),
            success: true,
            links: BTreeMap::new(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_user_login(mut self, login: impl Into<String>) -> Self {
        self.user_login = login.into();
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_link(mut self, role: impl Into<String>, uri: impl Into<String>) -> Self {
        self.links.insert(role.into(), uri.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A window into an ordered event sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of events to skip, counted from the oldest.
    pub offset: u64,
    /// Maximum number of events in the page. Always positive.
    pub limit: u32,
}

impl PageRequest {
    /// Builds a page window starting at `offset`.
    ///
    /// Returns `None` when `limit` is zero.
    pub fn new(offset: u64, limit: u32) -> Option<Self> {
        (limit > 0).then_some(Self { offset, limit })
    }

    /// The first page of the given size.
    pub fn first(limit: u32) -> Option<Self> {
        Self::new(0, limit)
    }
}

/// One page of results plus the window that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in ascending order; never longer than the requested limit.
    pub items: Vec<T>,
    /// The next window, or `None` at end of stream.
    pub next: Option<PageRequest>,
}

impl<T> Page<T> {
    /// Builds a page from the items a store returned for `request`.
    pub fn from_request(items: Vec<T>, request: PageRequest) -> Self {
        let next = cursor::next_cursor_for(request.offset, request.limit, items.len());
        Self { items, next }
    }
}

/// Who is calling and what they may see, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// The authenticated caller.
    pub user_id: String,
    /// The tenant the caller belongs to.
    pub domain: String,
    /// Whether the caller owns `domain`.
    pub is_domain_admin: bool,
}

/// Page-size bounds applied when decoding query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingSettings {
    /// Page size used when the request does not name one.
    pub default_limit: u32,
    /// Upper bound on any requested page size.
    pub max_limit: u32,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

pub mod cursor;
pub use cursor::CursorError;
