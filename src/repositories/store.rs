use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// ストア層のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// UNIQUE制約違反（メールアドレス重複）
    #[error("email already exists")]
    DuplicateEmail,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// ユーザー永続化のインターフェース
///
/// メールアドレスの一意性はストア側で原子的に保証すること
/// （事前の読み取りチェックだけに頼らない）
#[async_trait]
pub trait UserStore: Send + Sync {
    /// メールアドレスでユーザーを検索（大文字小文字を区別）
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// リセットトークンのハッシュでユーザーを検索
    async fn find_by_reset_token_hash(&self, token_hash: &str)
    -> Result<Option<User>, StoreError>;

    /// 新しいユーザーを作成
    ///
    /// # Errors
    /// - メールアドレス重複時: `StoreError::DuplicateEmail`
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// リセットトークンのハッシュと発行時刻を保存（既存のトークンは上書き）
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// パスワードを更新し、リセットトークンを消去
    ///
    /// 保存済みのトークンハッシュが `token_hash` と一致する場合のみ更新する。
    ///
    /// # Returns
    /// 更新された場合は `true`
    async fn complete_password_reset(
        &self,
        user_id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError>;
}
