use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Compress, web};
use dotenvy::dotenv;
use tracing::{info, warn};

use qrgen::api::jwt::JwtService;
use qrgen::api::routes;
use qrgen::api::services::auth::AuthSettings;
use qrgen::api::services::automation::AutomationState;
use qrgen::api::services::redirect::RedirectSettings;
use qrgen::config::Config;
use qrgen::services::dropbox::DropboxClient;
use qrgen::services::qr_service::QrService;
use qrgen::services::watcher::WatcherService;
use qrgen::services::AnalyticsService;
use qrgen::storage::SeaOrmStorage;
use qrgen::system::logging::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::load();
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging init failed: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match SeaOrmStorage::new(&config.storage.database_url, &config.storage.backend)
        .await
    {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("Storage init failed: {}", e);
            std::process::exit(1);
        }
    };

    let qr = QrService::new(
        storage.clone(),
        &config.features.base_url,
        config.features.slug_length,
    );
    let analytics = AnalyticsService::new(storage.clone());

    let jwt_secret = if config.api.jwt_secret.is_empty() {
        warn!("JWT_SECRET not set; generating a random secret (sessions reset on restart)");
        qrgen::utils::generate_slug(48)
    } else {
        config.api.jwt_secret.clone()
    };
    let jwt = JwtService::new(&jwt_secret, config.api.access_token_minutes);

    if config.api.admin_password.is_empty() {
        warn!("ADMIN_PASSWORD not set; the admin API will reject all logins");
    }

    // Dropbox is optional: without credentials the server still serves
    // codes and redirects, only the automation endpoints are inert.
    let watcher = if config.dropbox.is_configured() {
        match DropboxClient::new(&config.dropbox) {
            Ok(client) => {
                info!("Dropbox automation enabled for {}", config.dropbox.folder_path);
                Some(Arc::new(WatcherService::new(
                    storage.clone(),
                    Arc::new(client),
                    qr.clone(),
                    &config.dropbox.folder_path,
                    &config.features.verification_url,
                )))
            }
            Err(e) => {
                warn!("Dropbox client init failed, automation disabled: {}", e);
                None
            }
        }
    } else {
        info!("Dropbox credentials not configured, automation disabled");
        None
    };

    // Dropbox signs webhook deliveries with the app secret unless a
    // dedicated secret is configured.
    let webhook_secret = if config.dropbox.webhook_secret.is_empty() {
        config.dropbox.app_secret.clone()
    } else {
        config.dropbox.webhook_secret.clone()
    };
    let automation = web::Data::new(AutomationState {
        watcher,
        webhook_secret,
    });
    let auth_settings = web::Data::new(AuthSettings {
        admin_password: config.api.admin_password.clone(),
    });
    let redirect_settings = web::Data::new(RedirectSettings {
        fallback_url: config.features.fallback_redirect_url.clone(),
    });
    let storage_data = web::Data::new(storage);
    let qr_data = web::Data::new(qr);
    let analytics_data = web::Data::new(analytics);
    let jwt_data = web::Data::new(jwt);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(storage_data.clone())
            .app_data(qr_data.clone())
            .app_data(analytics_data.clone())
            .app_data(jwt_data.clone())
            .app_data(automation.clone())
            .app_data(auth_settings.clone())
            .app_data(redirect_settings.clone())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
