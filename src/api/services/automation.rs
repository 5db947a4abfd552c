//! Automation endpoints: Dropbox webhook, on-demand scans and debug info.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::api::auth::require_admin;
use crate::api::helpers::{api_result, error_response, success_response};
use crate::api::jwt::JwtService;
use crate::api::types::{ManualProcessRequest, WebhookChallenge};
use crate::errors::QrGenError;
use crate::services::watcher::WatcherService;
use crate::storage::SeaOrmStorage;

type HmacSha256 = Hmac<Sha256>;

/// Shared automation state. `watcher` is None when Dropbox credentials are
/// missing; the endpoints then answer with a configuration error instead of
/// failing at startup.
pub struct AutomationState {
    pub watcher: Option<Arc<WatcherService>>,
    pub webhook_secret: String,
}

impl AutomationState {
    fn watcher(&self) -> crate::errors::Result<&Arc<WatcherService>> {
        self.watcher
            .as_ref()
            .ok_or_else(|| QrGenError::configuration("Dropbox integration is not configured"))
    }
}

/// Hex HMAC-SHA256 of `body` under `secret`, the scheme Dropbox uses for
/// `X-Dropbox-Signature`.
pub fn compute_webhook_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn verify_webhook_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let expected = compute_webhook_signature(secret, body);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Webhook registration handshake: echo the challenge back as plain text.
pub async fn webhook_challenge(query: web::Query<WebhookChallenge>) -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/plain; charset=utf-8"))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .body(query.into_inner().challenge)
}

/// Change notification. The signature is checked against the raw body;
/// processing runs in the background so Dropbox gets its 200 within the
/// delivery timeout.
pub async fn webhook_notify(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AutomationState>,
) -> impl Responder {
    let provided = req
        .headers()
        .get("X-Dropbox-Signature")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if state.webhook_secret.is_empty() {
        warn!("No webhook secret configured; accepting notification unverified");
    } else if !verify_webhook_signature(&state.webhook_secret, &body, provided) {
        warn!("Webhook rejected: bad signature");
        return error_response(&QrGenError::forbidden("Invalid webhook signature"));
    }

    let watcher = match state.watcher() {
        Ok(watcher) => Arc::clone(watcher),
        Err(e) => return error_response(&e),
    };

    info!("Webhook accepted, scheduling scan");
    tokio::spawn(async move {
        match watcher.run_scan().await {
            Ok(report) => info!("Webhook scan: {}", report.summary()),
            Err(e) => error!("Webhook scan failed: {}", e),
        }
    });

    success_response(serde_json::json!({ "scheduled": true }))
}

/// Run a scan synchronously and return the full report.
pub async fn run_watch(
    req: HttpRequest,
    state: web::Data<AutomationState>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    let watcher = match state.watcher() {
        Ok(watcher) => watcher,
        Err(e) => return error_response(&e),
    };
    api_result(watcher.run_scan().await)
}

/// Process one named file, bypassing the ledger gate.
pub async fn manual_process(
    req: HttpRequest,
    body: web::Json<ManualProcessRequest>,
    state: web::Data<AutomationState>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    let watcher = match state.watcher() {
        Ok(watcher) => watcher,
        Err(e) => return error_response(&e),
    };
    api_result(watcher.process_by_name(&body.filename).await)
}

/// Pipeline introspection: configuration flags and the processing ledger.
pub async fn debug_info(
    req: HttpRequest,
    state: web::Data<AutomationState>,
    storage: web::Data<SeaOrmStorage>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    let ledger = match storage.list_processed_files().await {
        Ok(ledger) => ledger,
        Err(e) => return error_response(&e),
    };
    success_response(serde_json::json!({
        "dropbox_configured": state.watcher.is_some(),
        "folder_path": state.watcher.as_ref().map(|w| w.folder_path().to_string()),
        "ledger": ledger,
    }))
}
