//! Audit query service.
//!
//! Turns an already-authorized request into a page of events plus the link
//! to the next page. Callers must have passed the authorization gate first;
//! nothing here checks permissions.

use auditlog_store::{query_events, query_events_by_actor, StoreError};
use auditlog_types::{cursor, AuditEvent, Page, PageRequest};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Response body for both audit feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventsPage {
    /// Events in the order the store received them.
    pub items: Vec<AuditEvent>,
    /// The window following this page, if any.
    #[serde(skip)]
    pub next: Option<PageRequest>,
    /// Followable link to the next page; omitted at end of stream.
    #[serde(
        rename = "nextPageLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_page_link: Option<String>,
}

impl AuditEventsPage {
    fn new(page: Page<AuditEvent>, base_uri: &str) -> Self {
        let next_page_link = page.next.as_ref().map(|next| cursor::encode(next, base_uri));
        Self {
            items: page.items,
            next: page.next,
            next_page_link,
        }
    }
}

/// Returns one page of every event in `domain`.
///
/// # Errors
///
/// Returns `StoreError` if the event store query fails.
pub fn find_by_domain(
    conn: &Connection,
    domain: &str,
    request: PageRequest,
    base_uri: &str,
) -> Result<AuditEventsPage, StoreError> {
    let items = query_events(conn, domain, request)?;
    tracing::debug!(
        domain,
        offset = request.offset,
        limit = request.limit,
        count = items.len(),
        "served domain audit page"
    );
    Ok(AuditEventsPage::new(Page::from_request(items, request), base_uri))
}

/// Returns one page of the events `user_id` caused in `domain`.
///
/// # Errors
///
/// Returns `StoreError` if the event store query fails.
pub fn find_by_domain_and_user(
    conn: &Connection,
    domain: &str,
    user_id: &str,
    request: PageRequest,
    base_uri: &str,
) -> Result<AuditEventsPage, StoreError> {
    let items = query_events_by_actor(conn, domain, user_id, request)?;
    tracing::debug!(
        domain,
        user_id,
        offset = request.offset,
        limit = request.limit,
        count = items.len(),
        "served user audit page"
    );
    Ok(AuditEventsPage::new(Page::from_request(items, request), base_uri))
}
