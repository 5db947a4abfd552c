//! Route table.

use actix_web::web;

use crate::api::services::{auth, automation, qrcodes, redirect};

/// Register every route. Handlers pull their dependencies from `app_data`,
/// which `main` populates before this runs.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout)),
            )
            .service(
                web::scope("/automation")
                    .route(
                        "/dropbox-webhook",
                        web::get().to(automation::webhook_challenge),
                    )
                    .route(
                        "/dropbox-webhook",
                        web::post().to(automation::webhook_notify),
                    )
                    .route("/watch", web::post().to(automation::run_watch))
                    .route(
                        "/manual-process",
                        web::post().to(automation::manual_process),
                    )
                    .route("/debug", web::get().to(automation::debug_info)),
            )
            .service(
                web::scope("/qrcodes")
                    .route("", web::post().to(qrcodes::create_qrcode))
                    .route("", web::get().to(qrcodes::list_qrcodes))
                    .route("", web::delete().to(qrcodes::delete_all_qrcodes))
                    .route("/admin/stats", web::get().to(qrcodes::admin_stats))
                    .route("/slug/{slug}", web::get().to(qrcodes::get_qrcode_by_slug))
                    .route("/{id}", web::get().to(qrcodes::get_qrcode))
                    .route("/{id}", web::patch().to(qrcodes::update_qrcode))
                    .route("/{id}", web::delete().to(qrcodes::delete_qrcode))
                    .route("/{id}/image", web::get().to(qrcodes::qrcode_image))
                    .route("/{id}/analytics", web::get().to(qrcodes::qrcode_analytics))
                    .route("/{id}/clicks", web::get().to(qrcodes::qrcode_clicks)),
            ),
    )
    .route("/q/{slug}", web::get().to(redirect::handle_redirect));
}
