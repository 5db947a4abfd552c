//! QR code management endpoints.
//!
//! Creation, lookup and per-code analytics are public so the generator UI
//! and landing pages work without a session. Mutations, bulk deletion,
//! aggregate stats and listing dynamic codes require an admin token.

use actix_web::{HttpRequest, HttpResponse, Responder, web};

use crate::api::auth::require_admin;
use crate::api::helpers::{api_result, error_response, success_response};
use crate::api::jwt::JwtService;
use crate::api::types::{
    ClicksQuery, CreateQrRequest, ImageQuery, ListQuery, QrCodeListResponse, QrCodeResponse,
    TrendQuery, UpdateQrRequest,
};
use crate::errors::QrGenError;
use crate::services::analytics_service::{AnalyticsService, DEFAULT_TREND_DAYS};
use crate::services::qr_render::{self, DEFAULT_IMAGE_SIZE};
use crate::services::qr_service::{QrPatch, QrService};
use crate::storage::{QrCodeFilter, QrSort};

fn respond_qr(qr: crate::storage::QrCode, service: &QrService) -> QrCodeResponse {
    let scan_target = service.scan_target(&qr);
    QrCodeResponse { qr, scan_target }
}

pub async fn create_qrcode(
    body: web::Json<CreateQrRequest>,
    qr: web::Data<QrService>,
) -> impl Responder {
    let body = body.into_inner();
    api_result(
        qr.create(&body.title, &body.content, body.is_dynamic, body.options)
            .await
            .map(|created| respond_qr(created, &qr)),
    )
}

pub async fn list_qrcodes(
    req: HttpRequest,
    query: web::Query<ListQuery>,
    qr: web::Data<QrService>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    // Dynamic codes carry redirect destinations that may be private, so
    // listing them needs a session; everything else is public.
    if query.dynamic == Some(true) {
        if let Err(e) = require_admin(&req, &jwt) {
            return error_response(&e);
        }
    }
    let filter = QrCodeFilter {
        dynamic: query.dynamic,
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
        sort: query.sort.as_deref().map(QrSort::parse).unwrap_or_default(),
    };
    api_result(
        qr.list(&filter)
            .await
            .map(|page| QrCodeListResponse::from_page(page, |item| qr.scan_target(item))),
    )
}

pub async fn get_qrcode(path: web::Path<i64>, qr: web::Data<QrService>) -> impl Responder {
    api_result(
        qr.get(path.into_inner())
            .await
            .map(|found| respond_qr(found, &qr)),
    )
}

/// Public lookup by slug, used by landing pages.
pub async fn get_qrcode_by_slug(
    path: web::Path<String>,
    qr: web::Data<QrService>,
) -> impl Responder {
    api_result(
        qr.get_by_slug(&path.into_inner())
            .await
            .map(|found| respond_qr(found, &qr)),
    )
}

pub async fn update_qrcode(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateQrRequest>,
    qr: web::Data<QrService>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    let body = body.into_inner();
    let patch = QrPatch {
        title: body.title,
        content: body.content,
        is_dynamic: body.is_dynamic,
        options: body.options,
    };
    if patch.is_empty() {
        return error_response(&QrGenError::validation("Update request is empty"));
    }
    api_result(
        qr.update(path.into_inner(), patch)
            .await
            .map(|updated| respond_qr(updated, &qr)),
    )
}

pub async fn delete_qrcode(
    req: HttpRequest,
    path: web::Path<i64>,
    qr: web::Data<QrService>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    match qr.delete(path.into_inner()).await {
        Ok(()) => success_response(serde_json::json!({ "deleted": true })),
        Err(e) => error_response(&e),
    }
}

pub async fn delete_all_qrcodes(
    req: HttpRequest,
    qr: web::Data<QrService>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    api_result(
        qr.delete_all()
            .await
            .map(|count| serde_json::json!({ "deleted": count })),
    )
}

pub async fn admin_stats(
    req: HttpRequest,
    qr: web::Data<QrService>,
    jwt: web::Data<JwtService>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &jwt) {
        return error_response(&e);
    }
    api_result(qr.admin_stats().await)
}

/// Public image endpoint: PNG by default, SVG on request.
pub async fn qrcode_image(
    path: web::Path<i64>,
    query: web::Query<ImageQuery>,
    qr: web::Data<QrService>,
) -> impl Responder {
    let found = match qr.get(path.into_inner()).await {
        Ok(found) => found,
        Err(e) => return error_response(&e),
    };
    let target = qr.scan_target(&found);
    let size = query.size.unwrap_or(DEFAULT_IMAGE_SIZE);

    match query.format.as_deref().unwrap_or("png") {
        "svg" => match qr_render::render_svg(&target, size) {
            Ok(svg) => HttpResponse::Ok()
                .insert_header(("Content-Type", "image/svg+xml"))
                .insert_header(("Cache-Control", "public, max-age=3600"))
                .body(svg),
            Err(e) => error_response(&e),
        },
        "png" => match qr_render::render_png(&target, size) {
            Ok(png) => HttpResponse::Ok()
                .insert_header(("Content-Type", "image/png"))
                .insert_header(("Cache-Control", "public, max-age=3600"))
                .body(png),
            Err(e) => error_response(&e),
        },
        other => error_response(&QrGenError::validation(format!(
            "Unknown image format: {}",
            other
        ))),
    }
}

pub async fn qrcode_analytics(
    path: web::Path<i64>,
    query: web::Query<TrendQuery>,
    analytics: web::Data<AnalyticsService>,
) -> impl Responder {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    api_result(analytics.daily_trend(path.into_inner(), days).await)
}

pub async fn qrcode_clicks(
    path: web::Path<i64>,
    query: web::Query<ClicksQuery>,
    analytics: web::Data<AnalyticsService>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    api_result(
        analytics
            .click_history(path.into_inner(), page, limit)
            .await
            .map(|history| {
                serde_json::json!({
                    "items": history.items,
                    "pagination": {
                        "page": history.page,
                        "limit": history.limit,
                        "total": history.total,
                        "pages": history.pages(),
                    },
                })
            }),
    )
}
