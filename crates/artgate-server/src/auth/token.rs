//! HS256 bearer tokens
//!
//! Tokens are compact JWTs carrying `{userId, iat, exp}`, signed with
//! HMAC-SHA256 over the server-wide secret. Tokens minted by earlier
//! deployments with the same secret verify unchanged. Expiry is checked with
//! no leeway, and an `nbf` claim, when present, is honoured.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ArtgateError, Result};

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;
        validation.validate_nbf = true;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Mint a token for the given principal id
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        self.issue_with_claims(&Claims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        })
    }

    /// Mint a token with explicit claims
    pub fn issue_with_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ArtgateError::Token(format!("Failed to sign token: {e}")))
    }

    /// Verify algorithm, signature and time claims. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("Rejected expired token"),
                    ErrorKind::ImmatureSignature => tracing::debug!("Rejected token before nbf"),
                    _ => tracing::debug!("Rejected token: {e}"),
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const SECRET: &str = "test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, 3600)
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let token = tokens.issue("user-1").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let token = tokens
            .issue_with_claims(&Claims {
                user_id: "user-1".to_string(),
                iat: now - 7200,
                exp: now - 10,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_not_yet_valid_token_rejected() {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({"userId": "user-1", "exp": now + 3600, "nbf": now + 600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(service().verify(&token).is_none());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &Claims {
                user_id: "user-1".to_string(),
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(service().verify(&token).is_none());
    }

    #[test]
    fn test_missing_exp_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({"userId": "user-1"}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(service().verify(&token).is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue("user-1").unwrap();
        let other = TokenService::new("other-secret", 3600);
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let token = tokens.issue("user-1").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({"userId": "admin", "exp": i64::MAX})).unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(tokens.verify(&forged).is_none());
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let tokens = service();
        assert!(tokens.verify("").is_none());
        assert!(tokens.verify("abc").is_none());
        assert!(tokens.verify("a.b").is_none());
        assert!(tokens.verify("a.b.c.d").is_none());
        assert!(tokens.verify("!!.??.**").is_none());
    }

    #[test]
    fn test_claims_use_camel_case_user_id() {
        let claims = Claims {
            user_id: "u".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "u");
    }
}
