use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::error::AppError;
use crate::models::{NewUser, UserProfile};
use crate::repositories::UserStore;
use crate::services::clock::Clock;
use crate::services::email::EmailSender;
use crate::services::jwt::TokenIssuer;
use crate::services::password::CredentialHasher;

/// 未登録メールアドレスへのリセット要求の扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownEmailPolicy {
    /// 成功として扱う（ユーザー存在有無を漏洩しない）
    #[default]
    Silent,
    /// NotFound を返す
    Reject,
}

/// 認証サービスの設定
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// リセットトークンの有効期間
    pub reset_token_ttl: Duration,
    pub unknown_email_policy: UnknownEmailPolicy,
    /// リセットリンクのベースURL（未設定ならメールにはコードのみ記載）
    pub reset_url_base: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            reset_token_ttl: Duration::minutes(30),
            unknown_email_policy: UnknownEmailPolicy::Silent,
            reset_url_base: None,
        }
    }
}

/// ユーザー登録の入力
#[derive(Debug, Clone)]
pub struct NewUserInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// ログイン結果
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

/// 認証サービス
///
/// 依存はすべてコンストラクタで受け取る
#[derive(Clone)]
pub struct AuthService {
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) hasher: CredentialHasher,
    pub(crate) email_sender: Arc<dyn EmailSender>,
    pub(crate) token_issuer: TokenIssuer,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: AuthSettings,
    /// タイミング攻撃対策用のダミーハッシュ
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: CredentialHasher,
        email_sender: Arc<dyn EmailSender>,
        token_issuer: TokenIssuer,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Result<Self, AppError> {
        let dummy_hash: Arc<str> = hasher.hash("dummy-password-for-timing")?.into();

        Ok(Self {
            store,
            hasher,
            email_sender,
            token_issuer,
            clock,
            settings,
            dummy_hash,
        })
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }

    /// ユーザーを登録
    ///
    /// # Security
    /// - パスワードはログに出力しない
    /// - パスワードは即座にハッシュ化
    pub async fn create_user(&self, input: NewUserInput) -> Result<UserProfile, AppError> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            tracing::warn!(email = %input.email, "ユーザー登録失敗: メールアドレス重複");
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash_async(input.password).await?;

        // 同時登録時はストアの一意制約で DuplicateEmail になる
        let user = self
            .store
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "ユーザー登録成功");

        Ok(user.into())
    }

    /// メールアドレスとパスワードを検証
    ///
    /// 不一致・ユーザー不在はエラーではなく `None` を返す。
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, AppError> {
        let user = self.store.find_by_email(email).await?;

        match user {
            Some(user) => {
                let matched = self
                    .hasher
                    .verify_async(password.to_string(), user.password_hash.clone())
                    .await?;

                if matched {
                    tracing::info!(email = %email, "認証成功");
                    Ok(Some(user.into()))
                } else {
                    tracing::warn!(email = %email, "認証失敗: パスワード不一致");
                    Ok(None)
                }
            }
            None => {
                // 応答時間を揃えるためだけの検証なので結果は捨てる
                let _ = self
                    .hasher
                    .verify_async(password.to_string(), self.dummy_hash.to_string())
                    .await;
                tracing::warn!(email = %email, "認証失敗: ユーザー不在");
                Ok(None)
            }
        }
    }

    /// アクセストークンを発行
    ///
    /// 呼び出し側で認証済みであることが前提
    pub fn login(&self, user: &UserProfile) -> Result<AccessToken, AppError> {
        let access_token = self.token_issuer.issue(&user.name, &user.email)?;
        tracing::info!(user_id = %user.id, "アクセストークン発行");
        Ok(AccessToken { access_token })
    }
}
