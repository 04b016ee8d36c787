use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::Duration;
use tracing::debug;

use crate::{auth::claims::Claims, clock::Clock, config::JwtConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token, wrong issuer/audience, or expired.
    #[error("invalid token")]
    Invalid,
    #[error("token has no subject")]
    MissingSubject,
}

/// Issues and verifies HS256 bearer tokens. Built once from config at
/// startup and shared read-only.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::seconds(cfg.ttl_minutes.saturating_mul(60)),
            clock,
        }
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> anyhow::Result<String> {
        let now = self.clock.now();
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: Some(subject.to_owned()),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(subject = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, subject: &str) -> anyhow::Result<String> {
        self.issue(subject, self.access_ttl)
    }

    /// Correctly signed, unexpired token carrying no `sub` claim.
    #[cfg(test)]
    pub(crate) fn sign_without_subject(&self) -> String {
        let now = self.clock.now().unix_timestamp();
        let claims = Claims {
            sub: None,
            iat: now,
            exp: now + 600,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).unwrap()
    }

    /// Returns the subject of a valid token.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // Expiry is checked below against the injected clock, without leeway.
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if data.claims.exp <= self.clock.now().unix_timestamp() {
            debug!(exp = data.claims.exp, "jwt expired");
            return Err(TokenError::Invalid);
        }

        match data.claims.sub {
            Some(sub) if !sub.is_empty() => {
                debug!(subject = %sub, "jwt verified");
                Ok(sub)
            }
            _ => Err(TokenError::MissingSubject),
        }
    }
}
