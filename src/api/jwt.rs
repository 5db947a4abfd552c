//! Admin session tokens (HS256 JWT).
//!
//! Constructed once in `main` from the loaded config and handed to the
//! handlers that need it; no global instance.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::{QrGenError, Result};

/// Cookie that carries the admin token for browser clients.
pub const ADMIN_COOKIE: &str = "admin_token";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    pub fn token_lifetime_secs(&self) -> i64 {
        self.access_token_minutes as i64 * 60
    }

    pub fn issue_admin_token(&self) -> Result<String> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: "admin".to_string(),
            admin: true,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_token_minutes as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| QrGenError::configuration(format!("Token signing failed: {}", e)))
    }

    pub fn verify_admin_token(&self, token: &str) -> Result<AdminClaims> {
        let data = decode::<AdminClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| QrGenError::unauthorized("Invalid or expired token"))?;

        if !data.claims.admin {
            return Err(QrGenError::unauthorized("Token lacks admin scope"));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_valid_token() {
        let jwt = JwtService::new("test-secret", 15);
        let token = jwt.issue_admin_token().unwrap();
        let claims = jwt.verify_admin_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = JwtService::new("secret-a", 15);
        let verifier = JwtService::new("secret-b", 15);
        let token = issuer.issue_admin_token().unwrap();
        assert!(verifier.verify_admin_token(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let jwt = JwtService::new("test-secret", 15);
        assert!(jwt.verify_admin_token("not.a.jwt").is_err());
    }
}
