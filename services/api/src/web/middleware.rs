//! services/api/src/web/middleware.rs
//!
//! Caller identification for protected routes.
//!
//! Sign-in happens at the hosting gateway, which forwards the authenticated user's
//! id. Browsers cannot set headers on a WebSocket upgrade, so the id is also
//! accepted as a `user_id` query parameter.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::warn;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that resolves the calling user and inserts their id into request extensions.
///
/// If the id is missing or malformed, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = user_id_from_request(&req).ok_or_else(|| {
        warn!("Rejected request to {} without a valid user id", req.uri().path());
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

fn user_id_from_request(req: &Request) -> Option<Uuid> {
    let from_header = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let from_query = || {
        req.uri().query().and_then(|query| {
            query.split('&').find_map(|pair| {
                pair.strip_prefix("user_id=").map(str::to_string)
            })
        })
    };

    from_header
        .or_else(from_query)
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}
