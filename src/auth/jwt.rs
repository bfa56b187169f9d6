use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret.
    pub secret: String,
    pub expiry_days: i64,
}

pub fn issue_token(
    user_id: i32,
    email: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(config.expiry_days)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Checks signature and expiry, returning the embedded claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiry_days: 7,
        }
    }

    #[test]
    fn issued_token_validates() {
        let config = config("test-secret");
        let token = issue_token(4, "john.doe@company.com", &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 4);
        assert_eq!(claims.email, "john.doe@company.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config("test-secret");
        let now = Utc::now().timestamp();
        // Well past the default leeway.
        let claims = Claims {
            sub: 1,
            email: "a@b.io".to_string(),
            iat: now - 600,
            exp: now - 300,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = issue_token(1, "a@b.io", &config("alpha")).unwrap();
        assert!(validate_token(&token, &config("bravo")).is_err());
    }
}
