/// Account routes: registration, login and the caller's profile
use crate::{
    error::Result, middleware::AuthenticatedUser, services::UserView, state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

/// POST /api/auth/register
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = app_state
        .accounts
        .register(&req.name, &req.email, &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse { user: user.into() }),
    ))
}

/// POST /api/auth/login
/// The returned id is what later requests send as `X-User-Id`
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = app_state.accounts.login(&req.email, &req.password).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(UserResponse { user: user.into() }))
}

/// GET /api/auth/me
pub async fn me(auth: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: auth.user().into(),
    })
}
