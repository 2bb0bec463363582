//! Authentication service
//!
//! Tokens are issued by the site's account service; this crate only
//! verifies them.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    constants::roles,
    error::{AppError, AppResult},
};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // profile id
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn profile_id(&self) -> AppResult<i64> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Verify and decode a JWT token
    pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        if !roles::ALL.contains(&token_data.claims.role.as_str()) {
            return Err(AppError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(sub: &str, role: &str, expires_in: Duration, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            username: "alice".to_string(),
            role: role.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_token() {
        let t = token("10", roles::USER, Duration::hours(1), "secret");
        let claims = AuthService::verify_token(&t, "secret").unwrap();
        assert_eq!(claims.profile_id().unwrap(), 10);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let t = token("10", roles::USER, Duration::hours(1), "secret");
        assert!(matches!(
            AuthService::verify_token(&t, "other"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let t = token("10", roles::USER, Duration::hours(-2), "secret");
        assert!(matches!(
            AuthService::verify_token(&t, "secret"),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_unknown_role_and_bad_subject() {
        let t = token("10", "root", Duration::hours(1), "secret");
        assert!(AuthService::verify_token(&t, "secret").is_err());

        let t = token("not-a-number", roles::USER, Duration::hours(1), "secret");
        let claims = AuthService::verify_token(&t, "secret").unwrap();
        assert!(claims.profile_id().is_err());
    }
}
