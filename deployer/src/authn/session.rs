//! Session derived from the API token

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::DeployerError;

/// Role value the API assigns to administrators
pub const ADMIN_ROLE: u8 = 1;

/// Claims carried by the API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub id: u64,

    /// Username
    #[serde(default)]
    pub username: String,

    /// 1 = administrator, 2 = standard user
    pub role: u8,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Details of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub id: u64,
    pub username: String,
    pub role: u8,
}

impl UserDetails {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    /// Raw token string
    pub raw: String,

    /// Decoded claims
    pub claims: SessionClaims,
}

impl Session {
    /// Decode a session from a raw JWT.
    /// The signature is not checked here; the API verifies it on every call.
    pub fn from_token(raw: impl Into<String>) -> Result<Self, DeployerError> {
        let raw = raw.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<SessionClaims>(&raw, &DecodingKey::from_secret(b""), &validation)
            .map_err(|e| DeployerError::AuthError(format!("Failed to decode token: {}", e)))?;

        Ok(Self {
            raw,
            claims: token_data.claims,
        })
    }

    pub fn user_details(&self) -> UserDetails {
        UserDetails {
            id: self.claims.id,
            username: self.claims.username.clone(),
            role: self.claims.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == ADMIN_ROLE
    }

    /// Check if the token is expired. Tokens without `exp` never expire.
    pub fn is_expired(&self) -> bool {
        self.claims
            .exp
            .is_some_and(|exp| exp < Utc::now().timestamp())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims
            .exp
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}
