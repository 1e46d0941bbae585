use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::{auth::Claims, user::UserRole};

/// Which signing secret a token must verify under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Verification failures, resolved internally by the codec. Callers that
/// face the network collapse all three into a single message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

/// Signs and verifies access/refresh tokens. Built once at startup from the
/// auth configuration; read-only afterwards, so it is freely shared across
/// requests. Access and refresh tokens use distinct secrets: a refresh token
/// can never be replayed as an access token even though the claims schema is
/// identical.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(cfg.access_ttl_seconds as i64),
            refresh_ttl: Duration::days(cfg.refresh_ttl_days as i64),
        }
    }

    /// Short-lived token asserting identity and the role held at issuance.
    pub fn issue_access_token(&self, user_id: Uuid, role: UserRole) -> anyhow::Result<String> {
        self.issue_access_token_at(user_id, role, Utc::now().timestamp())
    }

    /// Long-lived token for minting new access tokens; role irrelevant.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_refresh_token_at(user_id, Utc::now().timestamp())
    }

    /// Decode and verify a token string under the secret selected by `kind`.
    /// No side effects on success; verifying twice yields identical claims.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, kind, Utc::now().timestamp())
    }

    pub(crate) fn issue_access_token_at(
        &self,
        user_id: Uuid,
        role: UserRole,
        now: i64,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            role: Some(role),
            iat: now,
            exp: now + self.access_ttl.num_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)?;
        Ok(token)
    }

    pub(crate) fn issue_refresh_token_at(&self, user_id: Uuid, now: i64) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            role: None,
            iat: now,
            exp: now + self.refresh_ttl.num_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)?;
        Ok(token)
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        // Expiry is checked below against the caller's clock, not by the
        // library, so the codec stays deterministic under an injected time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            _ => TokenError::Malformed,
        })?;

        if now > data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const ACCESS_TTL: i64 = 900;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig {
            access_secret: "access-secret-for-tests".into(),
            refresh_secret: "refresh-secret-for-tests".into(),
            access_ttl_seconds: ACCESS_TTL as u64,
            refresh_ttl_days: 30,
        })
    }

    #[test]
    fn access_round_trip_preserves_subject_and_role() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec
            .issue_access_token_at(id, UserRole::Moderator, NOW)
            .unwrap();

        let claims = codec.verify_at(&token, TokenKind::Access, NOW + 1).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, Some(UserRole::Moderator));
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + ACCESS_TTL);
    }

    #[test]
    fn refresh_token_carries_no_role_and_long_ttl() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue_refresh_token_at(id, NOW).unwrap();

        let claims = codec.verify_at(&token, TokenKind::Refresh, NOW).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, None);
        assert_eq!(claims.exp, NOW + 30 * 86_400);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec
            .issue_access_token_at(Uuid::new_v4(), UserRole::User, NOW)
            .unwrap();

        // Valid up to and including the expiry instant itself.
        assert!(codec
            .verify_at(&token, TokenKind::Access, NOW + ACCESS_TTL)
            .is_ok());
        assert_eq!(
            codec.verify_at(&token, TokenKind::Access, NOW + ACCESS_TTL + 1),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn secrets_are_not_interchangeable() {
        let codec = codec();
        let id = Uuid::new_v4();

        let refresh = codec.issue_refresh_token_at(id, NOW).unwrap();
        assert_eq!(
            codec.verify_at(&refresh, TokenKind::Access, NOW),
            Err(TokenError::SignatureInvalid)
        );

        let access = codec
            .issue_access_token_at(id, UserRole::User, NOW)
            .unwrap();
        assert_eq!(
            codec.verify_at(&access, TokenKind::Refresh, NOW),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn tampered_token_fails_verification() {
        let codec = codec();
        let token = codec
            .issue_access_token_at(Uuid::new_v4(), UserRole::User, NOW)
            .unwrap();

        // Flip one character in the payload segment.
        let payload_start = token.find('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        let i = payload_start + 4;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let err = codec
            .verify_at(&tampered, TokenKind::Access, NOW)
            .unwrap_err();
        assert!(matches!(
            err,
            TokenError::SignatureInvalid | TokenError::Malformed
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert_eq!(
            codec.verify_at("not-a-token", TokenKind::Access, NOW),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.verify_at("", TokenKind::Access, NOW),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn verification_is_idempotent() {
        let codec = codec();
        let token = codec
            .issue_access_token_at(Uuid::new_v4(), UserRole::Admin, NOW)
            .unwrap();

        let first = codec.verify_at(&token, TokenKind::Access, NOW).unwrap();
        let second = codec.verify_at(&token, TokenKind::Access, NOW).unwrap();
        assert_eq!(first, second);
    }
}
