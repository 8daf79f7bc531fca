use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::services::SessionClaims;
use crate::state::AppState;

/// Bearer トークンで認証済みのユーザー
///
/// `Authorization: Bearer <jwt>` を検証し、クレームを取り出す。
/// ヘッダーがない・検証失敗の場合は 401。
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.auth_service.token_issuer().verify(token)?;
        Ok(Self(claims))
    }
}

/// Authorization ヘッダーから Bearer トークンを取り出す
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/auth/me");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
