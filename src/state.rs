use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserStore;
use crate::services::{AuthService, CredentialHasher, EmailSender, SystemClock, TokenIssuer};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 認証サービス
    pub auth_service: AuthService,
}

impl AppState {
    /// 新しい AppState を作成
    ///
    /// ストアとメール送信者は呼び出し側で選択して渡す
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let hasher = CredentialHasher::new(config.password_hash_cost)?;
        let token_issuer =
            TokenIssuer::new(config.jwt_secret.expose_secret(), config.jwt_lifetime());

        let auth_service = AuthService::new(
            store,
            hasher,
            email_sender,
            token_issuer,
            Arc::new(SystemClock),
            config.auth_settings(),
        )?;

        Ok(Self {
            config,
            auth_service,
        })
    }
}
