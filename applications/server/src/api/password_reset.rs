/// Password reset routes (one-time code by mail)
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RequestCode {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCode {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

/// POST /api/password-reset/request-otp
pub async fn request_otp(
    State(app_state): State<AppState>,
    Json(req): Json<RequestCode>,
) -> Result<Json<MessageResponse>> {
    app_state.accounts.request_reset_code(&req.email).await?;
    Ok(message("OTP sent to your email"))
}

/// POST /api/password-reset/verify-otp
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(req): Json<VerifyCode>,
) -> Result<Json<MessageResponse>> {
    app_state
        .accounts
        .verify_reset_code(&req.email, &req.otp)
        .await?;
    Ok(message("OTP verified successfully"))
}

/// POST /api/password-reset/reset-password
pub async fn reset_password(
    State(app_state): State<AppState>,
    Json(req): Json<ResetPassword>,
) -> Result<Json<MessageResponse>> {
    app_state
        .accounts
        .reset_password(&req.email, &req.otp, &req.new_password)
        .await?;
    Ok(message("Password reset successfully"))
}
