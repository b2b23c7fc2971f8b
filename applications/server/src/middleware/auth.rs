/// Caller identification middleware
///
/// Callers identify themselves with an `X-User-Id` header or a `userId`
/// query parameter. The id is only checked against the user store; there is
/// no credential on the request.
use crate::{error::ServerError, state::AppState};
use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use cadence_core::types::{Caller, User, UserId};
use serde::Deserialize;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extension type holding the resolved caller
/// Can be used as an extractor in handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn user_id(&self) -> &UserId {
        &self.0.id
    }

    pub fn caller(&self) -> Caller {
        self.0.caller()
    }
}

#[derive(Debug, Deserialize)]
struct CallerQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Header first, then the `userId` query parameter
fn caller_id(parts: &Parts) -> Option<UserId> {
    let from_header = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(UserId::from);

    from_header.or_else(|| {
        Query::<CallerQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.user_id)
            .filter(|id| !id.trim().is_empty())
            .map(|id| UserId::new(id.trim()))
    })
}

async fn resolve(state: &AppState, id: &UserId) -> Result<User, ServerError> {
    state.accounts.get_user(id).await?.ok_or_else(|| {
        tracing::warn!(user_id = %id, "Rejected unknown user id");
        ServerError::Auth("Invalid user ID".to_string())
    })
}

/// Middleware that resolves the caller and rejects anonymous requests
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let (mut parts, body) = request.into_parts();

    let user_id = caller_id(&parts)
        .ok_or_else(|| ServerError::Auth("No user ID, authorization denied".to_string()))?;
    let user = resolve(&state, &user_id).await?;

    // Insert user into request extensions
    parts.extensions.insert(AuthenticatedUser(user));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Middleware for admin-only routes; must run after `auth_middleware`
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ServerError> {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ServerError::Auth("No user ID, authorization denied".to_string()))?
        .0
        .is_admin;

    if !is_admin {
        return Err(ServerError::Unauthorized(
            "Access denied. Admin privileges required".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))
    }
}

/// Caller on public routes, if one identified itself
///
/// An id that does not resolve is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

impl OptionalUser {
    pub fn caller(&self) -> Option<Caller> {
        self.0.as_ref().map(User::caller)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match caller_id(parts) {
            Some(id) => Ok(Self(Some(resolve(state, &id).await?))),
            None => Ok(Self(None)),
        }
    }
}
