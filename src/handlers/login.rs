use axum::{Json, extract::State};
use garde::Validate;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::CurrentUser;
use crate::handlers::validation::validate_request;
use crate::models::UserProfile;
use crate::services::{AccessToken, AuthService, SessionClaims};
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// ユーザーのメールアドレス
    #[garde(email)]
    pub email: String,
    /// ユーザーのパスワード
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// 資格情報ガード
///
/// 入力を検証し、メールアドレスとパスワードが一致するユーザーを返す。
/// 一致しない場合は 401。
pub async fn authenticate_credentials(
    auth_service: &AuthService,
    request: &LoginRequest,
) -> Result<UserProfile, AppError> {
    validate_request(request)?;

    auth_service
        .validate_credentials(&request.email, &request.password)
        .await?
        .ok_or(AppError::InvalidCredentials)
}

/// ログインハンドラー
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let user = authenticate_credentials(&state.auth_service, &request).await?;
    let token = state.auth_service.login(&user)?;
    Ok(Json(token))
}

/// GET /auth/me
///
/// 検証済みトークンのクレームをそのまま返す
pub async fn me(CurrentUser(claims): CurrentUser) -> Json<SessionClaims> {
    Json(claims)
}
