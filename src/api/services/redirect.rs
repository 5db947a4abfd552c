//! Scan-time redirect for dynamic QR codes.

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, warn};

use crate::services::qr_service::QrService;
use crate::utils::hash_ip;
use crate::utils::ip::extract_client_ip;

#[derive(Clone)]
pub struct RedirectSettings {
    /// Where unknown or retired slugs land instead of a hard 404; a scanner
    /// holding a printed code should always end up somewhere.
    pub fallback_url: String,
}

pub async fn handle_redirect(
    req: HttpRequest,
    path: web::Path<String>,
    qr: web::Data<QrService>,
    settings: web::Data<RedirectSettings>,
) -> impl Responder {
    let slug = path.into_inner();

    let found = match qr.get_by_slug(&slug).await {
        Ok(found) => found,
        Err(e) => {
            debug!("Redirect for unknown slug '{}': {}", slug, e);
            return soft_redirect(&settings.fallback_url);
        }
    };

    record_click(&req, &qr, found.id);

    if found.is_dynamic && !is_redirectable(&found.content) {
        // Destination not set yet (automation still running) or not a URL.
        debug!("Dynamic slug '{}' has no usable destination yet", slug);
        soft_redirect(&settings.fallback_url)
    } else if is_redirectable(&found.content) {
        redirect_to(&found.content)
    } else {
        // Static non-URL payload (wifi config, plain text); show it as-is.
        HttpResponse::Ok()
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body(found.content)
    }
}

/// Click recording is best-effort and off the request path: a full clicks
/// table must never break a scan.
fn record_click(req: &HttpRequest, qr: &web::Data<QrService>, qrcode_id: i64) {
    let storage = qr.storage().clone();
    let ip = extract_client_ip(req).map(|raw| hash_ip(&raw));
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|ua| ua.chars().take(512).collect::<String>());

    tokio::spawn(async move {
        if let Err(e) = storage.insert_click(qrcode_id, ip, user_agent).await {
            warn!("Click recording failed for QR {}: {}", qrcode_id, e);
        }
    });
}

fn redirect_to(url: &str) -> HttpResponse {
    // 307 keeps scanners from caching the destination of a dynamic code.
    HttpResponse::TemporaryRedirect()
        .insert_header(("Location", url))
        .insert_header(("Cache-Control", "no-store"))
        .finish()
}

fn soft_redirect(fallback: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header(("Location", fallback))
        .insert_header(("Cache-Control", "no-store"))
        .finish()
}

fn is_redirectable(content: &str) -> bool {
    url::Url::parse(content)
        .map(|u| matches!(u.scheme(), "http" | "https" | "mailto" | "tel"))
        .unwrap_or(false)
}
