use axum::{Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::validation::{not_blank, validate_request};
use crate::models::UserProfile;
use crate::services::NewUserInput;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 100), custom(not_blank))]
    pub name: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

/// ユーザー登録ハンドラー
///
/// POST /auth/register
///
/// # Security
/// - パスワードはログに出力しない
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    validate_request(&request)?;

    let profile = state
        .auth_service
        .create_user(NewUserInput {
            email: request.email,
            password: request.password,
            name: request.name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, name: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_request(&request("", "Test User", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_request(&request("invalid-email", "Test User", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_blank_name() {
        let result = validate_request(&request("test@example.com", "   ", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let result = validate_request(&request("test@example.com", "Test User", "short"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_request(&request("test@example.com", "Test User", "password123"));
        assert!(result.is_ok());
    }
}
