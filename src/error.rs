use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::repositories::StoreError;
use crate::services::email::EmailError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("メールアドレスまたはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("認証が必要です")]
    Unauthorized,

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("メール送信エラー")]
    EmailDelivery(#[from] EmailError),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("ユーザーが見つかりません")]
    UserNotFound,

    #[error("トークンが見つかりません")]
    TokenNotFound,

    #[error("トークンが一致しません")]
    TokenMismatch,

    #[error("無効または期限切れのリンクです")]
    TokenExpired,

    #[error("以前と同じパスワードは使用できません")]
    PasswordReused,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::EmailAlreadyExists,
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::EmailDelivery(e) => {
                tracing::error!(error = %e, "メール送信エラー");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "メールの送信に失敗しました。しばらくしてから再度お試しください".to_string(),
                )
            }
            Self::EmailAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
            Self::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::TokenNotFound => (StatusCode::NOT_FOUND, "無効なトークンです".to_string()),
            Self::TokenMismatch => (StatusCode::UNAUTHORIZED, "無効なトークンです".to_string()),
            Self::TokenExpired => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::PasswordReused => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
