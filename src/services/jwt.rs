use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::AppError;

/// JWT クレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub name: String,
    pub email: String,
    /// 発行時刻（Unix秒）
    pub iat: i64,
    /// 有効期限（Unix秒）
    pub exp: i64,
}

/// アクセストークン発行・検証（HS256）
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    /// 新しい TokenIssuer を作成
    ///
    /// # Arguments
    /// * `secret` - 共有シークレット
    /// * `lifetime` - トークンの有効期間
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// `{name, email}` を署名してアクセストークンを発行
    pub fn issue(&self, name: &str, email: &str) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let exp = now.checked_add(self.lifetime).ok_or_else(|| {
            tracing::error!(lifetime = %self.lifetime, "JWT 有効期限の計算でオーバーフロー");
            AppError::Internal(anyhow::anyhow!("jwt lifetime overflow"))
        })?;
        let claims = SessionClaims {
            name: name.to_string(),
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "JWT 署名エラー");
            AppError::Internal(anyhow::anyhow!("jwt encode error"))
        })
    }

    /// アクセストークンを検証してクレームを返す
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = ?e, "JWT 検証失敗");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        let token = issuer.issue("Test User", "test@example.com").unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.name, "Test User");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_payload_has_only_expected_fields() {
        use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        let token = issuer.issue("Test User", "test@example.com").unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "exp", "iat", "name"]);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        let other = TokenIssuer::new("another-secret-another-secret-xx", Duration::hours(1));
        let token = other.issue("Test User", "test@example.com").unwrap();

        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_verify_expired_token() {
        let issuer = TokenIssuer::new(SECRET, Duration::seconds(-10));
        let token = issuer.issue("Test User", "test@example.com").unwrap();

        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_issue_with_overflowing_lifetime() {
        let issuer = TokenIssuer::new(SECRET, Duration::seconds(i64::MAX));
        assert!(matches!(
            issuer.issue("Test User", "test@example.com"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_verify_garbage() {
        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        assert!(matches!(
            issuer.verify("not-a-jwt"),
            Err(AppError::Unauthorized)
        ));
    }
}
