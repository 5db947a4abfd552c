//! Request authentication for the admin surface.

use actix_web::HttpRequest;
use actix_web::http::header;

use crate::api::jwt::{ADMIN_COOKIE, AdminClaims, JwtService};
use crate::errors::{QrGenError, Result};

/// Admin gate used by every protected handler.
///
/// Accepts the session cookie set by login, or a bearer token for API
/// clients. One function rather than middleware, so each handler's auth
/// requirement is visible at its call site.
pub fn require_admin(req: &HttpRequest, jwt: &JwtService) -> Result<AdminClaims> {
    if let Some(cookie) = req.cookie(ADMIN_COOKIE) {
        return jwt.verify_admin_token(cookie.value());
    }

    if let Some(token) = bearer_token(req) {
        return jwt.verify_admin_token(token);
    }

    Err(QrGenError::unauthorized("Authentication required"))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
