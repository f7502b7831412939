//! Audit feed handlers.
//!
//! Provides:
//! - `GET /api/audit-events` — every event in the caller's domain (owner only)
//! - `GET /api/account/audit-events` — events caused by the caller
//!
//! Both accept `offset` and `limit` query parameters and answer with
//! `{ "items": [...], "nextPageLink": "..." }`.
//!
//! Checks run in a fixed order: caller identity (middleware), then the
//! authorization gate, then query-string and cursor decoding. The event
//! store is only reached once all of them have passed, and a caller who may
//! not see a feed learns nothing from how their query string was malformed.

use crate::api::ApiError;
use crate::middleware::CallerIdentity;
use crate::service::{find_by_domain, find_by_domain_and_user, AuditEventsPage};
use crate::{authz, AppState};
use auditlog_types::cursor;
use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

/// Path of the whole-domain feed.
pub const DOMAIN_EVENTS_PATH: &str = "/api/audit-events";
/// Path of the caller's own feed.
pub const USER_EVENTS_PATH: &str = "/api/account/audit-events";

/// Query parameters for both feeds.
///
/// Values stay strings here; [`cursor::decode`] owns their validation so
/// that malformed numbers get the same error body as out-of-range ones.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    /// Events to skip (default 0).
    pub offset: Option<String>,
    /// Page size (default and max from `[paging]`).
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Domain,
    User,
}

impl Feed {
    fn path(self) -> &'static str {
        match self {
            Feed::Domain => DOMAIN_EVENTS_PATH,
            Feed::User => USER_EVENTS_PATH,
        }
    }
}

/// Handler for `GET /api/audit-events`.
pub async fn list_domain_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<AuditEventsPage>, ApiError> {
    list_events(state, caller, query, Feed::Domain).await
}

/// Handler for `GET /api/account/audit-events`.
pub async fn list_user_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<AuditEventsPage>, ApiError> {
    list_events(state, caller, query, Feed::User).await
}

async fn list_events(
    state: Arc<AppState>,
    caller: CallerIdentity,
    query: Result<Query<PageQuery>, QueryRejection>,
    feed: Feed,
) -> Result<Json<AuditEventsPage>, ApiError> {
    // Rejections are held back until the caller has been authorized.
    let query = query
        .map(|Query(query)| query)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()));

    let page = tokio::task::spawn_blocking(move || {
        let ctx = authz::resolve_caller(state.directory.as_ref(), &caller.0, feed == Feed::Domain)?;

        let query = query?;
        let request = cursor::decode(query.offset.as_deref(), query.limit.as_deref(), state.paging)?;

        let conn = state.pool.get()?;
        let base_uri = format!("{}{}", state.public_url, feed.path());
        let page = match feed {
            Feed::Domain => find_by_domain(&conn, &ctx.domain, request, &base_uri)?,
            Feed::User => {
                find_by_domain_and_user(&conn, &ctx.domain, &ctx.user_id, request, &base_uri)?
            }
        };
        Ok::<_, ApiError>(page)
    })
    .await??;

    Ok(Json(page))
}
