//! Authenticated principals and Axum extractors.
//!
//! The identity provider is an external collaborator: it hands the core an
//! authenticated principal (user id plus role) per request, and the core
//! trusts it as given. Every workflow operation takes the [`Principal`]
//! explicitly rather than reading ambient session state.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn my_bookings(session: SessionUser) -> Result<Json<...>, ApiError> {
//!     // session.0.user_id is guaranteed valid
//! }
//!
//! async fn approve(admin: RequireAdmin) -> Result<Json<...>, ApiError> {
//!     // admin.0.role is guaranteed Admin
//! }
//! ```

use crate::api::error::ApiError;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub use crate::types::UserId;

/// Role of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular requester.
    Member,
    /// Back-office administrator.
    Admin,
}

/// An authenticated caller, supplied by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Granted role.
    pub role: Role,
}

impl Principal {
    /// Creates a member principal.
    #[must_use]
    pub const fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Member,
        }
    }

    /// Creates an admin principal.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Whether the caller holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Resolves bearer tokens to principals.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a bearer token to the principal it belongs to, if valid.
    async fn resolve(&self, token: &str) -> Option<Principal>;
}

/// In-memory session store for tests and local development.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Principal>>>,
}

impl MemorySessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a principal and returns a fresh bearer token for it.
    #[must_use]
    pub fn issue(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().to_string();
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(token.clone(), principal);
        }
        token
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn resolve(&self, token: &str) -> Option<Principal> {
        self.sessions.read().ok()?.get(token).copied()
    }
}

/// Bearer token extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                ApiError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(ApiError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token))
    }
}

/// Extractor yielding the authenticated principal for the request.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    Arc<dyn SessionStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let sessions = Arc::<dyn SessionStore>::from_ref(state);
        let principal = sessions
            .resolve(&token)
            .await
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;
        Ok(Self(principal))
    }
}

/// Extractor that additionally requires the admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    Arc<dyn SessionStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(principal) = SessionUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(Self(principal))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn issued_tokens_resolve_to_their_principal() {
        let store = MemorySessionStore::new();
        let principal = Principal::admin(UserId::new());
        let token = store.issue(principal);

        assert_eq!(store.resolve(&token).await, Some(principal));
        assert_eq!(store.resolve("bogus").await, None);
    }
}
