use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::api::ApiError;

/// Header carrying the authenticated caller's user id.
///
/// It is set by the authenticating proxy in front of this service; the
/// service itself does not verify credentials.
pub const USER_ID_HEADER: &str = "X-Auditlog-User-Id";

/// The caller's user id, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

/// Middleware that requires a caller identity on every request.
///
/// A missing, blank or non-UTF-8 header ends the request with `401` before
/// any handler runs.
pub async fn caller_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized("user id header missing".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("user id header is not valid text".to_string()))?
        .trim()
        .to_string();

    if user_id.is_empty() {
        return Err(ApiError::Unauthorized("user id header is blank".to_string()));
    }

    req.extensions_mut().insert(CallerIdentity(user_id));

    Ok(next.run(req).await)
}
