//! Session token access
//!
//! The identity provider owns the session; this module only models how the
//! client obtains a bearer token from it. Tokens rotate, so providers are
//! asked for a fresh token immediately before every request rather than the
//! result being cached anywhere.

use analogous_shared::UserId;
use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Source of bearer tokens for backend requests.
///
/// Injected per call so tests can substitute a fake session and so token
/// rotation is never bypassed by a stale module-level cache.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for the current session, or
    /// [`ApiError::AuthenticationRequired`] when there is no usable session.
    async fn bearer_token(&self) -> Result<String, ApiError>;
}

/// Provider backed by a single pre-issued token (CLI usage and tests)
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::AuthenticationRequired);
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Extract the user id from an access token's `sub` claim.
///
/// The backend is the one verifying signatures; the client only needs the
/// subject for URL paths, so the signature check is skipped. Expiry is still
/// validated, which turns an expired session into `AuthenticationRequired`
/// before a request is ever sent.
pub fn user_id_from_token(token: &str) -> Result<UserId, ApiError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| ApiError::AuthenticationRequired)?;

    Uuid::parse_str(&data.claims.sub)
        .map(UserId::from)
        .map_err(|_| ApiError::Decode("token subject is not a user id".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use time::OffsetDateTime;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn make_token(sub: &str, exp_offset_secs: i64) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            exp: OffsetDateTime::now_utc().unix_timestamp() + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"not-the-real-secret"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("tok-123");
        assert_eq!(provider.bearer_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty_token() {
        let provider = StaticTokenProvider::new("");
        assert!(matches!(
            provider.bearer_token().await,
            Err(ApiError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_user_id_from_token() {
        let id = Uuid::new_v4();
        let token = make_token(&id.to_string(), 3600);
        assert_eq!(user_id_from_token(&token).unwrap(), UserId(id));
    }

    #[test]
    fn test_expired_token_requires_authentication() {
        let token = make_token(&Uuid::new_v4().to_string(), -3600);
        assert!(matches!(
            user_id_from_token(&token),
            Err(ApiError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_garbage_token_requires_authentication() {
        assert!(matches!(
            user_id_from_token("not-a-jwt"),
            Err(ApiError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_a_decode_error() {
        let token = make_token("service-account", 3600);
        assert!(matches!(
            user_id_from_token(&token),
            Err(ApiError::Decode(_))
        ));
    }
}
