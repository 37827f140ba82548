use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, users::repo_types::User};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Symmetric signing material plus issuer and lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: TimeDuration,
}

impl JwtKeys {
    pub fn new(secret: &str, issuer: &str, ttl: TimeDuration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(&cfg.secret, &cfg.issuer, TimeDuration::minutes(cfg.ttl_minutes))
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iss: self.issuer.clone(),
            sub: user.id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    /// Verifies signature, algorithm, issuer and expiry. Expiry is strict:
    /// a token is rejected once `exp <= now`, with no leeway.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Invalid("token expired".into()));
        }

        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
