//! Caller identity for the mutation endpoints.
//!
//! Handlers take an [`Identity`] argument; the extractor reads
//! `Authorization: Bearer <token>` and asks the configured
//! [`IdentityVerifier`] to turn it into a uid and role.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

/// Authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub role: Role,
    pub email: Option<String>,
    /// Display name, copied onto the reviews this caller writes.
    pub name: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Turns a bearer token into an [`Identity`].
pub trait IdentityVerifier: Send + Sync {
    /// # Errors
    ///
    /// `Unauthorized` if the token cannot be verified.
    fn verify(&self, token: &str) -> Result<Identity, ApiError>;
}

pub type SharedVerifier = Arc<dyn IdentityVerifier>;

/// Token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: u64,
}

/// HS256 verifier with a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ApiError::unauthorized("Unauthorized")
        })?;
        Ok(Identity {
            uid: data.claims.sub,
            role: data.claims.role,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

/// Rejects every token. Used when no secret is configured.
pub struct DenyAll;

impl IdentityVerifier for DenyAll {
    fn verify(&self, _token: &str) -> Result<Identity, ApiError> {
        Err(ApiError::unauthorized("Unauthorized"))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    SharedVerifier: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        SharedVerifier::from_ref(state).verify(token)
    }
}
