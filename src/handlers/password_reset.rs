use axum::{Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::CurrentUser;
use crate::handlers::validation::{not_blank, validate_request};
use crate::state::AppState;

// === リセットリクエスト ===

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestRequest {
    #[garde(email)]
    pub email: String,
}

/// POST /auth/reset-password/token
///
/// 202 を返す（本文なし）。未登録メールアドレスの扱いは設定に従う
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequestRequest>,
) -> Result<StatusCode, AppError> {
    validate_request(&request)?;

    state
        .auth_service
        .request_password_reset(&request.email)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/me/reset-password
///
/// ログイン中ユーザー自身のパスワードリセットをリクエスト
pub async fn request_own_password_reset(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<StatusCode, AppError> {
    state
        .auth_service
        .request_password_reset(&claims.email)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[garde(length(min = 1, max = 256), custom(not_blank))]
    pub token: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

/// POST /auth/reset-password
///
/// # Security
/// - token, password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_request(&request)?;

    state
        .auth_service
        .complete_password_reset(&request.token, &request.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        let request = ResetRequestRequest {
            email: "".to_string(),
        };
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let request = ResetRequestRequest {
            email: "invalid-email".to_string(),
        };
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        let request = ResetRequestRequest {
            email: "test@example.com".to_string(),
        };
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_validate_empty_token() {
        let request = ResetPasswordRequest {
            token: "".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            password: "short".to_string(),
        };
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_reset_request() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_request(&request).is_ok());
    }
}
