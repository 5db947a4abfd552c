//! Admin login and logout.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{Responder, web};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::api::helpers::{error_response, success_response};
use crate::api::jwt::{ADMIN_COOKIE, JwtService};
use crate::api::types::{LoginRequest, LoginResponse};
use crate::errors::QrGenError;

/// Credentials the login handler checks against, taken from config.
#[derive(Clone)]
pub struct AuthSettings {
    pub admin_password: String,
}

impl AuthSettings {
    fn password_matches(&self, candidate: &str) -> bool {
        // Constant-time compare; an empty configured password disables login.
        !self.admin_password.is_empty()
            && self
                .admin_password
                .as_bytes()
                .ct_eq(candidate.as_bytes())
                .into()
    }
}

pub async fn login(
    body: web::Json<LoginRequest>,
    auth: web::Data<AuthSettings>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if auth.admin_password.is_empty() {
        warn!("Login attempted but no admin password is configured");
        return error_response(&QrGenError::unauthorized("Admin API is disabled"));
    }
    if !auth.password_matches(&body.password) {
        info!("Admin login failed: wrong password");
        return error_response(&QrGenError::unauthorized("Invalid password"));
    }

    let token = match jwt.issue_admin_token() {
        Ok(token) => token,
        Err(e) => return error_response(&e),
    };
    let expires_in = jwt.token_lifetime_secs();

    let cookie = Cookie::build(ADMIN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(actix_web::cookie::time::Duration::seconds(expires_in))
        .finish();

    info!("Admin login succeeded");
    let mut resp = success_response(LoginResponse { token, expires_in });
    if let Err(e) = resp.add_cookie(&cookie) {
        warn!("Could not attach session cookie: {}", e);
    }
    resp
}

pub async fn logout() -> impl Responder {
    let expired = Cookie::build(ADMIN_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(actix_web::cookie::time::Duration::ZERO)
        .finish();

    let mut resp = success_response(serde_json::json!({ "logged_out": true }));
    let _ = resp.add_cookie(&expired);
    resp
}
