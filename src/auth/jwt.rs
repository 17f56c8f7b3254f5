use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{AccessClaims, Expiring, Identity, RefreshClaims};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signs `claims` with an expiry `ttl` after `issued_at`.
pub fn issue_token_at<C>(
    mut claims: C,
    key: &EncodingKey,
    ttl: Duration,
    issued_at: OffsetDateTime,
) -> Result<String, TokenError>
where
    C: Serialize + Expiring,
{
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| issued_at.checked_add(TimeDuration::seconds(secs)))
        .ok_or_else(|| TokenError::Signing("token lifetime out of range".into()))?;
    claims.set_times(
        issued_at.unix_timestamp() as usize,
        exp.unix_timestamp() as usize,
    );
    encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

pub fn issue_token<C>(claims: C, key: &EncodingKey, ttl: Duration) -> Result<String, TokenError>
where
    C: Serialize + Expiring,
{
    issue_token_at(claims, key, ttl, OffsetDateTime::now_utc())
}

pub fn issue_access_token(
    identity: &Identity,
    key: &EncodingKey,
    ttl: Duration,
) -> Result<String, TokenError> {
    issue_token(AccessClaims::for_identity(identity), key, ttl)
}

pub fn issue_refresh_token(
    identity: &Identity,
    key: &EncodingKey,
    ttl: Duration,
) -> Result<String, TokenError> {
    issue_token(RefreshClaims::for_identity(identity), key, ttl)
}

/// Checks signature and expiry and returns the decoded claims.
pub fn verify<C: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<C, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    decode::<C>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing and verification keys for both token kinds.
#[derive(Clone)]
pub struct JwtKeys {
    pub access_encoding: EncodingKey,
    pub access_decoding: DecodingKey,
    pub refresh_encoding: EncodingKey,
    pub refresh_decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes.max(0) as u64).saturating_mul(60)),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access_token = issue_access_token(identity, &self.access_encoding, self.access_ttl)?;
        let refresh_token = issue_refresh_token(identity, &self.refresh_encoding, self.refresh_ttl)?;
        debug!(user_id = %identity.id, "token pair signed");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_decoding)
    }
}
