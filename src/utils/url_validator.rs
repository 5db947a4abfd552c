//! QR content validation.
//!
//! Blocks script-injection style schemes while tolerating arbitrary text:
//! QR codes legitimately encode things that are not URLs at all.

use url::Url;

#[derive(Debug)]
pub enum UrlValidationError {
    DangerousScheme(String),
    DisallowedScheme(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DangerousScheme(scheme) => {
                write!(f, "URL scheme '{}' is not allowed", scheme)
            }
            Self::DisallowedScheme(scheme) => write!(
                f,
                "URL scheme '{}' is not allowed. Use http, https, mailto or tel",
                scheme
            ),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// Schemes that are always rejected.
const DANGEROUS_SCHEMES: &[&str] = &[
    "javascript:",
    "data:",
    "vbscript:",
    "file:",
    "about:",
    "blob:",
];

/// Schemes accepted for well-formed absolute URLs.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Validate QR content safety.
///
/// Rules:
/// 1. Dangerous schemes are rejected outright, well-formed or not.
/// 2. Content that parses as an absolute URL must use an allowed scheme.
/// 3. Content that does not parse is tolerated (plain-text payloads).
pub fn validate_qr_content(content: &str) -> Result<(), UrlValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let lower = trimmed.to_lowercase();
    for scheme in DANGEROUS_SCHEMES {
        if lower.starts_with(scheme) {
            return Err(UrlValidationError::DangerousScheme(scheme.to_string()));
        }
    }

    match Url::parse(trimmed) {
        Ok(parsed) => {
            let scheme = parsed.scheme().to_lowercase();
            if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
                return Err(UrlValidationError::DisallowedScheme(scheme));
            }
            Ok(())
        }
        // Relative URLs and free-form text land here.
        Err(_) => Ok(()),
    }
}
