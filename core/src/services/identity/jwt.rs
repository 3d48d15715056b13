//! HS256 JWT identity assertions

use async_trait::async_trait;
use chrono::Duration;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use otp_shared::config::IdentityConfig;

use crate::domain::value_objects::{IdentityAssertion, PhoneKey};
use crate::errors::{DomainError, DomainResult};
use crate::services::clock::{Clock, SystemClock};
use crate::services::verification::IdentityAssertionIssuer;

/// Authentication method reference recorded in every token
pub const AUTH_METHOD_OTP: &str = "otp";

/// Claims carried by an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Verified phone number in canonical form
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Unique token id
    pub jti: String,

    /// How the subject was authenticated
    pub amr: Vec<String>,
}

/// Signs identity tokens for verified phones
pub struct JwtIdentityIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtIdentityIssuer {
    /// Create an issuer from the identity configuration
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::seconds(config.token_ttl_seconds),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verify a token and return its claims
    ///
    /// # Returns
    ///
    /// * `Ok(IdentityClaims)` - Signature, issuer, audience and expiry are valid
    /// * `Err(DomainError::IdentityIssuer)` - Token is invalid, expired or malformed
    pub fn decode(&self, token: &str) -> DomainResult<IdentityClaims> {
        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::IdentityIssuer {
                message: match e.kind() {
                    ErrorKind::ExpiredSignature => "identity token expired".to_string(),
                    _ => format!("invalid identity token: {}", e),
                },
            })
    }
}

#[async_trait]
impl IdentityAssertionIssuer for JwtIdentityIssuer {
    async fn issue(&self, phone_key: &PhoneKey) -> DomainResult<IdentityAssertion> {
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        let claims = IdentityClaims {
            sub: phone_key.as_str().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            amr: vec![AUTH_METHOD_OTP.to_string()],
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::IdentityIssuer {
                message: format!("failed to sign identity token: {}", e),
            })?;

        Ok(IdentityAssertion {
            subject: phone_key.clone(),
            token,
            token_type: "Bearer".to_string(),
            expires_at,
            expires_in_seconds: self.ttl.num_seconds(),
        })
    }
}
