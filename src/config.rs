use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application configuration.
///
/// Loaded once at startup from a TOML file (if present) with environment
/// variable overrides, then passed explicitly to the components that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dropbox: DropboxConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite", "mysql" or "postgres"; empty infers from the database URL.
    #[serde(default)]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Password for the single admin account. Empty disables admin login.
    #[serde(default)]
    pub admin_password: String,
    /// HS256 signing secret. Empty means a random secret is generated at
    /// startup (sessions do not survive restarts in that case).
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxConfig {
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Root folder scanned for incoming PDFs.
    #[serde(default = "default_dropbox_folder")]
    pub folder_path: String,
    /// Secret for webhook signature checks; the app secret is used when empty.
    #[serde(default)]
    pub webhook_secret: String,
}

impl DropboxConfig {
    pub fn is_configured(&self) -> bool {
        !self.app_key.is_empty() && !self.app_secret.is_empty() && !self.refresh_token.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Public base URL of this deployment, embedded into dynamic QR images.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Landing page used when a redirect slug does not exist.
    #[serde(default = "default_fallback_url")]
    pub fallback_redirect_url: String,
    #[serde(default = "default_slug_length")]
    pub slug_length: usize,
    /// Document-verification URL stamped next to the redirect code on
    /// processed PDFs. Empty disables the second stamp.
    #[serde(default)]
    pub verification_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; empty logs to stdout.
    #[serde(default)]
    pub file: String,
    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://qrgen.db?mode=rwc".to_string()
}

fn default_access_token_minutes() -> u64 {
    60 * 24
}

fn default_dropbox_folder() -> String {
    "/qrgen-inbox".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_fallback_url() -> String {
    "/".to_string()
}

fn default_slug_length() -> usize {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            dropbox: DropboxConfig::default(),
            features: FeatureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: String::new(),
            database_url: default_database_url(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_password: String::new(),
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
        }
    }
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            refresh_token: String::new(),
            folder_path: default_dropbox_folder(),
            webhook_secret: String::new(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_redirect_url: default_fallback_url(),
            slug_length: default_slug_length(),
            verification_url: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file with environment variable fallback.
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    fn load_from_file() -> Self {
        let config_paths = ["config.toml", "qrgen.toml", "/etc/qrgen/config.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<Config>(&content) {
                        Ok(config) => return config,
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    fn override_with_env(&mut self) {
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.storage.database_url = database_url;
        }

        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            self.api.admin_password = password;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.api.jwt_secret = secret;
        }
        if let Ok(minutes) = env::var("ACCESS_TOKEN_MINUTES") {
            if let Ok(minutes) = minutes.parse() {
                self.api.access_token_minutes = minutes;
            }
        }

        if let Ok(app_key) = env::var("DROPBOX_APP_KEY") {
            self.dropbox.app_key = app_key.trim().to_string();
        }
        if let Ok(app_secret) = env::var("DROPBOX_APP_SECRET") {
            self.dropbox.app_secret = app_secret.trim().to_string();
        }
        if let Ok(refresh_token) = env::var("DROPBOX_REFRESH_TOKEN") {
            self.dropbox.refresh_token = refresh_token.trim().to_string();
        }
        if let Ok(folder) = env::var("DROPBOX_FOLDER_PATH") {
            self.dropbox.folder_path = folder;
        }
        if let Ok(secret) = env::var("DROPBOX_WEBHOOK_SECRET") {
            self.dropbox.webhook_secret = secret;
        }

        if let Ok(base_url) = env::var("BASE_URL") {
            self.features.base_url = base_url;
        }
        if let Ok(url) = env::var("VERIFICATION_URL") {
            self.features.verification_url = url;
        }
        if let Ok(url) = env::var("FALLBACK_REDIRECT_URL") {
            self.features.fallback_redirect_url = url;
        }

        if let Ok(level) = env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(file) = env::var("LOG_FILE") {
            self.logging.file = file;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}
