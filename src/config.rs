use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use time::Duration;

use crate::services::auth::{AuthSettings, UnknownEmailPolicy};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// 未設定の場合はインメモリストアで起動する（開発用）
    #[serde(default)]
    pub database_url: Option<SecretBox<String>>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // JWT設定
    /// HS256 署名用の共有シークレット（32バイト以上）
    pub jwt_secret: SecretBox<String>,
    #[serde(default = "default_jwt_expires_in_secs")]
    pub jwt_expires_in_secs: i64,

    // パスワードハッシュ設定
    /// argon2 の反復回数（t_cost）
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,

    // パスワードリセット設定
    #[serde(default)]
    pub password_reset_url_base: Option<String>,
    #[serde(default = "default_password_reset_token_ttl_secs")]
    pub password_reset_token_ttl_secs: i64,
    #[serde(default)]
    pub reset_unknown_email_policy: UnknownEmailPolicy,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,

    // CORS設定（カンマ区切り）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 設定の読み込み・検証エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("環境変数の読み込みに失敗: {0}")]
    Env(#[from] envy::Error),

    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_JWT_EXPIRES_IN_SECS: i64 = 3600;
const DEFAULT_PASSWORD_HASH_COST: u32 = 3;
const DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS: i64 = 30 * 60;

const MIN_JWT_SECRET_LEN: usize = 32;
const MAX_PASSWORD_HASH_COST: u32 = 10;
const MAX_JWT_EXPIRES_IN_SECS: i64 = 30 * 24 * 60 * 60;
const MAX_PASSWORD_RESET_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_jwt_expires_in_secs() -> i64 {
    DEFAULT_JWT_EXPIRES_IN_SECS
}

fn default_password_hash_cost() -> u32 {
    DEFAULT_PASSWORD_HASH_COST
}

fn default_password_reset_token_ttl_secs() -> i64 {
    DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS
}

impl Config {
    /// 環境変数から設定を読み込み、検証する
    ///
    /// 不正な値があれば起動時に失敗させる
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "JWT_SECRET は{}バイト以上必要です",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.jwt_expires_in_secs <= 0 || self.jwt_expires_in_secs > MAX_JWT_EXPIRES_IN_SECS {
            return Err(ConfigError::Invalid(format!(
                "JWT_EXPIRES_IN_SECS は1〜{}の範囲で指定してください",
                MAX_JWT_EXPIRES_IN_SECS
            )));
        }
        if self.password_hash_cost == 0 || self.password_hash_cost > MAX_PASSWORD_HASH_COST {
            return Err(ConfigError::Invalid(format!(
                "PASSWORD_HASH_COST は1〜{}の範囲で指定してください",
                MAX_PASSWORD_HASH_COST
            )));
        }
        if self.password_reset_token_ttl_secs <= 0
            || self.password_reset_token_ttl_secs > MAX_PASSWORD_RESET_TOKEN_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "PASSWORD_RESET_TOKEN_TTL_SECS は1〜{}の範囲で指定してください",
                MAX_PASSWORD_RESET_TOKEN_TTL_SECS
            )));
        }
        Ok(())
    }

    /// SMTP 送信に必要な設定がすべて揃っているか
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
            && self.smtp_from_address.is_some()
    }

    /// 認証サービス向けの設定を切り出す
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            reset_token_ttl: Duration::seconds(self.password_reset_token_ttl_secs),
            unknown_email_policy: self.reset_unknown_email_policy,
            reset_url_base: self.password_reset_url_base.clone(),
        }
    }

    pub fn jwt_lifetime(&self) -> Duration {
        Duration::seconds(self.jwt_expires_in_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let config: Config = envy::from_iter(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = load_from(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_expires_in_secs, 3600);
        assert_eq!(config.password_hash_cost, 3);
        assert_eq!(config.password_reset_token_ttl_secs, 1800);
        assert_eq!(
            config.reset_unknown_email_policy,
            UnknownEmailPolicy::Silent
        );
        assert!(!config.smtp_configured());
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn test_missing_jwt_secret() {
        let result = load_from(&[]);
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_short_jwt_secret() {
        let result = load_from(&[("JWT_SECRET", "short")]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_hash_cost() {
        let result = load_from(&[("JWT_SECRET", SECRET), ("PASSWORD_HASH_COST", "0")]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = load_from(&[("JWT_SECRET", SECRET), ("PASSWORD_HASH_COST", "11")]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_ttl() {
        let result = load_from(&[
            ("JWT_SECRET", SECRET),
            ("PASSWORD_RESET_TOKEN_TTL_SECS", "0"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_lifetimes() {
        let max = i64::MAX.to_string();

        let result = load_from(&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN_SECS", max.as_str())]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = load_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRES_IN_SECS", "2592001"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = load_from(&[
            ("JWT_SECRET", SECRET),
            ("PASSWORD_RESET_TOKEN_TTL_SECS", max.as_str()),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = load_from(&[
            ("JWT_SECRET", SECRET),
            ("PASSWORD_RESET_TOKEN_TTL_SECS", "86401"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        // 上限ちょうどは許可
        let config = load_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRES_IN_SECS", "2592000"),
            ("PASSWORD_RESET_TOKEN_TTL_SECS", "86400"),
        ])
        .unwrap();
        assert_eq!(config.jwt_lifetime(), Duration::days(30));
        assert_eq!(config.auth_settings().reset_token_ttl, Duration::days(1));
    }

    #[test]
    fn test_reject_policy_and_origins() {
        let config = load_from(&[
            ("JWT_SECRET", SECRET),
            ("RESET_UNKNOWN_EMAIL_POLICY", "reject"),
            (
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:5173,https://app.example.com",
            ),
        ])
        .unwrap();
        assert_eq!(config.reset_unknown_email_policy, UnknownEmailPolicy::Reject);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn test_auth_settings() {
        let config = load_from(&[
            ("JWT_SECRET", SECRET),
            ("PASSWORD_RESET_URL_BASE", "https://app.example.com/reset"),
        ])
        .unwrap();
        let settings = config.auth_settings();
        assert_eq!(settings.reset_token_ttl, Duration::minutes(30));
        assert_eq!(
            settings.reset_url_base.as_deref(),
            Some("https://app.example.com/reset")
        );
    }
}
