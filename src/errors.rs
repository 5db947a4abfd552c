use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum QrGenError {
    NotFound(String),
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    Configuration(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    RemoteStorage(String),
    PdfProcessing(String),
    FileOperation(String),
    Serialization(String),
}

impl QrGenError {
    /// Stable error code, kept for log grepping and API clients.
    pub fn code(&self) -> &'static str {
        match self {
            QrGenError::NotFound(_) => "E001",
            QrGenError::Validation(_) => "E002",
            QrGenError::Unauthorized(_) => "E003",
            QrGenError::Forbidden(_) => "E004",
            QrGenError::Configuration(_) => "E005",
            QrGenError::DatabaseConfig(_) => "E006",
            QrGenError::DatabaseConnection(_) => "E007",
            QrGenError::DatabaseOperation(_) => "E008",
            QrGenError::RemoteStorage(_) => "E009",
            QrGenError::PdfProcessing(_) => "E010",
            QrGenError::FileOperation(_) => "E011",
            QrGenError::Serialization(_) => "E012",
        }
    }

    /// Numeric form of [`code`](Self::code), used in API response bodies.
    pub fn code_number(&self) -> i32 {
        match self {
            QrGenError::NotFound(_) => 1,
            QrGenError::Validation(_) => 2,
            QrGenError::Unauthorized(_) => 3,
            QrGenError::Forbidden(_) => 4,
            QrGenError::Configuration(_) => 5,
            QrGenError::DatabaseConfig(_) => 6,
            QrGenError::DatabaseConnection(_) => 7,
            QrGenError::DatabaseOperation(_) => 8,
            QrGenError::RemoteStorage(_) => 9,
            QrGenError::PdfProcessing(_) => 10,
            QrGenError::FileOperation(_) => 11,
            QrGenError::Serialization(_) => 12,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            QrGenError::NotFound(_) => "Resource Not Found",
            QrGenError::Validation(_) => "Validation Error",
            QrGenError::Unauthorized(_) => "Unauthorized",
            QrGenError::Forbidden(_) => "Forbidden",
            QrGenError::Configuration(_) => "Configuration Error",
            QrGenError::DatabaseConfig(_) => "Database Configuration Error",
            QrGenError::DatabaseConnection(_) => "Database Connection Error",
            QrGenError::DatabaseOperation(_) => "Database Operation Error",
            QrGenError::RemoteStorage(_) => "Remote Storage Error",
            QrGenError::PdfProcessing(_) => "PDF Processing Error",
            QrGenError::FileOperation(_) => "File Operation Error",
            QrGenError::Serialization(_) => "Serialization Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            QrGenError::NotFound(msg)
            | QrGenError::Validation(msg)
            | QrGenError::Unauthorized(msg)
            | QrGenError::Forbidden(msg)
            | QrGenError::Configuration(msg)
            | QrGenError::DatabaseConfig(msg)
            | QrGenError::DatabaseConnection(msg)
            | QrGenError::DatabaseOperation(msg)
            | QrGenError::RemoteStorage(msg)
            | QrGenError::PdfProcessing(msg)
            | QrGenError::FileOperation(msg)
            | QrGenError::Serialization(msg) => msg,
        }
    }

    /// HTTP status the API layer answers with for this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            QrGenError::NotFound(_) => StatusCode::NOT_FOUND,
            QrGenError::Validation(_) => StatusCode::BAD_REQUEST,
            QrGenError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            QrGenError::Forbidden(_) => StatusCode::FORBIDDEN,
            QrGenError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QrGenError::RemoteStorage(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for QrGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for QrGenError {}

impl QrGenError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        QrGenError::NotFound(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        QrGenError::Validation(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        QrGenError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        QrGenError::Forbidden(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        QrGenError::Configuration(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        QrGenError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        QrGenError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        QrGenError::DatabaseOperation(msg.into())
    }

    pub fn remote_storage<T: Into<String>>(msg: T) -> Self {
        QrGenError::RemoteStorage(msg.into())
    }

    pub fn pdf_processing<T: Into<String>>(msg: T) -> Self {
        QrGenError::PdfProcessing(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        QrGenError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        QrGenError::Serialization(msg.into())
    }
}

impl From<sea_orm::DbErr> for QrGenError {
    fn from(err: sea_orm::DbErr) -> Self {
        QrGenError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for QrGenError {
    fn from(err: std::io::Error) -> Self {
        QrGenError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for QrGenError {
    fn from(err: serde_json::Error) -> Self {
        QrGenError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for QrGenError {
    fn from(err: reqwest::Error) -> Self {
        QrGenError::RemoteStorage(err.to_string())
    }
}

impl From<lopdf::Error> for QrGenError {
    fn from(err: lopdf::Error) -> Self {
        QrGenError::PdfProcessing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QrGenError>;
