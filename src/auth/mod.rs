use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::DbId;

/// Claims carried by tokens from the upstream identity service.
///
/// `user_id` arrives as a JSON number from most issuers but some send it as a
/// string; anything that does not resolve to a positive integer becomes 0.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "lenient_user_id")]
    pub user_id: DbId,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: DbId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn lenient_user_id<'de, D>(deserializer: D) -> Result<DbId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Invalid authorization format. Use 'Bearer <token>'")]
    InvalidScheme,

    #[error("Invalid token")]
    Malformed(String),

    #[error("Invalid token")]
    SignatureInvalid,

    #[error("Token has expired")]
    Expired,

    #[error("User ID not found in token")]
    SubjectMissing,
}

impl AuthError {
    /// Extra detail safe to hand back to the caller
    pub fn detail(&self) -> Option<String> {
        match self {
            AuthError::Malformed(reason) => Some(reason.clone()),
            AuthError::SignatureInvalid => Some("signature mismatch".to_string()),
            _ => None,
        }
    }
}

/// Pull the token out of an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    if header.trim().is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }
    Ok(token)
}

/// Verifies HMAC-signed tokens against the single configured secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, then return the acting user id
    pub fn verify(&self, token: &str) -> Result<DbId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::Malformed(e.to_string()),
            }
        })?;

        if data.claims.user_id <= 0 {
            return Err(AuthError::SubjectMissing);
        }
        Ok(data.claims.user_id)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Mint an HS256 token. Tokens are normally issued upstream; this exists for
/// local tooling and tests.
pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn sign(claims: serde_json::Value, alg: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn round_trips_generated_token() {
        let token = generate_jwt(&Claims::new(42, Duration::minutes(5)), SECRET).unwrap();
        assert_eq!(TokenVerifier::new(SECRET).verify(&token), Ok(42));
    }

    #[test]
    fn accepts_other_hmac_algorithms_and_string_ids() {
        let verifier = TokenVerifier::new(SECRET);
        let token = sign(json!({ "user_id": 7, "exp": future() }), Algorithm::HS512, SECRET);
        assert_eq!(verifier.verify(&token), Ok(7));

        let token = sign(json!({ "user_id": "19", "exp": future() }), Algorithm::HS256, SECRET);
        assert_eq!(verifier.verify(&token), Ok(19));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let now = Utc::now().timestamp();
        let token = sign(json!({ "user_id": 1, "exp": now - 300, "iat": now - 600 }), Algorithm::HS256, SECRET);
        assert_eq!(TokenVerifier::new(SECRET).verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn no_grace_period_after_expiry() {
        let now = Utc::now().timestamp();
        let token = sign(json!({ "user_id": 1, "exp": now - 5 }), Algorithm::HS256, SECRET);
        assert_eq!(TokenVerifier::new(SECRET).verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn wrong_secret_is_signature_invalid() {
        let token = sign(json!({ "user_id": 1, "exp": future() }), Algorithm::HS256, "other-secret");
        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token),
            Err(AuthError::SignatureInvalid)
        );
    }

    #[test]
    fn missing_or_zero_subject() {
        let verifier = TokenVerifier::new(SECRET);
        for claims in [
            json!({ "exp": future() }),
            json!({ "user_id": 0, "exp": future() }),
            json!({ "user_id": "abc", "exp": future() }),
            json!({ "user_id": null, "exp": future() }),
        ] {
            let token = sign(claims, Algorithm::HS256, SECRET);
            assert_eq!(verifier.verify(&token), Err(AuthError::SubjectMissing));
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let err = TokenVerifier::new(SECRET).verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn missing_exp_is_malformed() {
        let token = sign(json!({ "user_id": 3 }), Algorithm::HS256, SECRET);
        assert!(matches!(
            TokenVerifier::new(SECRET).verify(&token),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token(None), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token(Some("")), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token(Some("Token abc")), Err(AuthError::InvalidScheme));
        assert_eq!(bearer_token(Some("Bearer ")), Err(AuthError::InvalidScheme));
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let err = generate_jwt(&Claims::new(1, Duration::minutes(1)), "").unwrap_err();
        assert!(matches!(err, JwtError::InvalidSecret));
    }
}
