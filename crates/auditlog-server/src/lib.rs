//! Audit log query server.
//!
//! Serves two read-only, paginated feeds over the audit event log: the
//! whole-domain feed for domain owners and the self feed for any known user.

pub mod api;
pub mod api_audit;
pub mod authz;
pub mod config;
pub mod directory;
pub mod middleware;
pub mod service;

use auditlog_db::DbPool;
use auditlog_types::PagingSettings;
use axum::{routing::get, Extension, Json, Router};
use directory::Directory;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
///
/// Everything here is either immutable or internally synchronized; no
/// request writes to it.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// User/domain directory consulted by the authorization gate.
    pub directory: Arc<dyn Directory>,
    /// Page size bounds.
    pub paging: PagingSettings,
    /// Prefix for next-page links, without a trailing slash. May be empty.
    pub public_url: String,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let audit_routes = Router::new()
        .route(
            api_audit::DOMAIN_EVENTS_PATH,
            get(api_audit::list_domain_events_handler),
        )
        .route(
            api_audit::USER_EVENTS_PATH,
            get(api_audit::list_user_events_handler),
        )
        .layer(axum::middleware::from_fn(middleware::caller_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(audit_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
