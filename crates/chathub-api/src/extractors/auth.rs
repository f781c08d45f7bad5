//! Identity gate and the `AuthUser` extractor.
//!
//! Authentication itself happens upstream. The gate only reads the identity
//! the upstream proxy vouched for.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the caller's identity from an incoming request.
pub trait AuthGate: Send + Sync + std::fmt::Debug + 'static {
    /// Identity of the caller, or an `Authentication` error.
    fn identify(&self, parts: &Parts) -> AppResult<UserId>;
}

/// Query fallback for clients that cannot set headers (browser WebSockets).
#[derive(Debug, Deserialize)]
struct IdentityQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Trusts an identity header set by an authenticating proxy, falling back
/// to a `userId` query parameter.
#[derive(Debug, Clone)]
pub struct TrustedHeaderGate {
    header: String,
}

impl TrustedHeaderGate {
    /// Creates a gate reading `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }
}

impl AuthGate for TrustedHeaderGate {
    fn identify(&self, parts: &Parts) -> AppResult<UserId> {
        let from_header = parts
            .headers
            .get(self.header.as_str())
            .map(|v| {
                v.to_str()
                    .map(str::to_owned)
                    .map_err(|_| AppError::authentication("Identity header is not valid text"))
            })
            .transpose()?;

        let raw = match from_header {
            Some(raw) => raw,
            None => Query::<IdentityQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|q| q.0.user_id)
                .ok_or_else(|| AppError::authentication("Missing caller identity"))?,
        };

        raw.trim()
            .parse()
            .map_err(|_| AppError::authentication(format!("Invalid caller identity: {raw}")))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// Returns the caller's identity.
    pub fn id(&self) -> UserId {
        self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(state.auth.identify(parts)?))
    }
}
