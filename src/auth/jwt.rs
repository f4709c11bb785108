use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    state::AppState,
};

/// Why a token was refused. Only ever logged; callers see a single 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(1, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn sign_at(&self, user_id: Uuid, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: issued_at.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Signature, issuer and audience are checked by `jsonwebtoken`; expiry is
    /// checked here so that a token is dead from the exact second `exp` names.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if now.unix_timestamp() >= data.claims.exp as i64 {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&test_config().jwt)
    }

    fn make_keys_with(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let keys = JwtKeys::new(&JwtConfig {
            ttl_minutes: i64::MAX,
            ..test_config().jwt
        });
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, MAX_TTL_MINUTES as usize * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys();
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(10);
        let token = keys.sign_at(Uuid::new_v4(), issued).expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_dies_exactly_at_exp() {
        let keys = make_keys();
        let issued = OffsetDateTime::now_utc();
        let token = keys.sign_at(Uuid::new_v4(), issued).expect("sign");

        let just_before = issued + TimeDuration::minutes(5) - TimeDuration::seconds(1);
        assert!(keys.verify_at(&token, just_before).is_ok());

        let at_exp = issued + TimeDuration::minutes(5);
        assert_eq!(
            keys.verify_at(&token, at_exp).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn altered_signature_is_rejected() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        let sig_start = token.rfind('.').expect("three segments") + 1;

        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(
            keys.verify(&tampered).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = make_keys_with("secret-a", "test-issuer", "test-aud");
        let theirs = make_keys_with("secret-b", "test-issuer", "test-aud");
        let token = theirs.sign(Uuid::new_v4()).expect("sign");
        assert_eq!(ours.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_keys_with("same-secret", "good-iss", "good-aud");
        let bad = make_keys_with("same-secret", "bad-iss", "bad-aud");
        let token = good.sign(Uuid::new_v4()).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys();
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("a.b.c").unwrap_err(), TokenError::Malformed);
    }
}
