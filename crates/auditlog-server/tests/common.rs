//! Shared setup for the audit API integration tests.
#![allow(dead_code)]

use auditlog_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use auditlog_server::{app, directory::Directory, middleware::USER_ID_HEADER, AppState};
use auditlog_store::save_event;
use auditlog_types::{AuditEvent, PagingSettings};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const DOMAIN: &str = "acme";
pub const OWNER: &str = "user-one";
pub const MEMBER: &str = "user-two";

/// A file-backed database that lives as long as the harness.
pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("audit.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).expect("failed to run migrations");
    }
    TestDb { pool, _dir: dir }
}

pub const LOGIN: &str = "STANDARD_LOGIN";
pub const DATA_EXPORT: &str = "DATA_EXPORT";

/// Seeds e1(OWNER), e2(MEMBER), e3(OWNER) saved twice, e4(OWNER), e5(MEMBER).
///
/// e1 is a dashboard export carrying links and params; the rest are logins.
pub fn seed_fixture(pool: &DbPool) -> Vec<AuditEvent> {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let actors = [OWNER, MEMBER, OWNER, OWNER, MEMBER];
    let mut events: Vec<AuditEvent> = actors
        .iter()
        .enumerate()
        .map(|(i, actor)| {
            AuditEvent::new(DOMAIN, *actor, LOGIN, base + Duration::seconds(i as i64))
        })
        .collect();
    events[0] = AuditEvent::new(DOMAIN, OWNER, DATA_EXPORT, base)
        .with_user_login("owner@acme.example")
        .with_link("project", "/projects/p1")
        .with_link("dashboard", "/projects/p1/dashboards/7")
        .with_param("format", "application/pdf");
    events[3] = events[3].clone().with_success(false);

    let conn = pool.get().unwrap();
    for (i, event) in events.iter().enumerate() {
        save_event(&conn, event).unwrap();
        if i == 2 {
            save_event(&conn, event).unwrap();
        }
    }
    events
}

pub fn make_state(pool: DbPool, directory: Arc<dyn Directory>) -> AppState {
    AppState {
        pool,
        directory,
        paging: PagingSettings::default(),
        public_url: String::new(),
    }
}

/// Sends a GET as `user` (or anonymously) and returns status plus JSON body.
pub async fn get_json(
    application: &Router,
    uri: &str,
    user: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let response = application
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Returns the ids of the events in a page body.
pub fn item_ids(body: &serde_json::Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("body should have items")
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

pub fn ids_of<'a>(events: impl IntoIterator<Item = &'a AuditEvent>) -> Vec<String> {
    events.into_iter().map(|e| e.id.clone()).collect()
}

pub fn build(pool: DbPool, directory: Arc<dyn Directory>) -> Router {
    app(make_state(pool, directory))
}
