use crate::error::AppError;
use crate::services::auth::{AuthService, UnknownEmailPolicy};
use crate::services::email::EmailTemplate;
use crate::services::reset_token::{generate_reset_token, hash_reset_token};

/// パスワードリセット
///
/// 状態遷移: リセットなし → リセット待ち（ハッシュ・発行時刻を保存）→ 完了（消去）。
/// 期限切れは検証時に判定し、新しいリクエストはどの状態からでもトークンを上書きする。
impl AuthService {
    /// パスワードリセットをリクエスト
    ///
    /// # Security
    /// - トークン（平文）はメールでのみ送信し、ログに出力しない
    /// - 未登録メールアドレスの扱いは `UnknownEmailPolicy` に従う
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        let user = match self.store.find_by_email(email).await? {
            Some(u) => u,
            None => match self.settings.unknown_email_policy {
                UnknownEmailPolicy::Silent => {
                    tracing::info!(email = %email, "パスワードリセット: ユーザー不在（成功レスポンス返却）");
                    return Ok(());
                }
                UnknownEmailPolicy::Reject => {
                    tracing::warn!(email = %email, "パスワードリセット: ユーザー不在");
                    return Err(AppError::UserNotFound);
                }
            },
        };

        let token = generate_reset_token();
        let token_hash = hash_reset_token(&token);

        self.store
            .set_reset_token(user.id, &token_hash, self.clock.now())
            .await?;

        let template = EmailTemplate::PasswordReset {
            name: user.name.clone(),
            reset_url: self.build_reset_url(&token),
            token,
        };

        self.email_sender
            .send(&user.email, &template)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, email = %user.email, "パスワードリセットメール送信失敗");
                AppError::EmailDelivery(e)
            })?;

        tracing::info!(user_id = %user.id, "パスワードリセットメール送信完了");

        Ok(())
    }

    /// パスワードをリセット
    ///
    /// トークンハッシュのみで検索し、成功時はトークンを消去する
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let token_hash = hash_reset_token(token);

        let user = self
            .store
            .find_by_reset_token_hash(&token_hash)
            .await?
            .ok_or(AppError::TokenNotFound)?;

        if user.reset_token_hash.as_deref() != Some(token_hash.as_str()) {
            tracing::warn!(user_id = %user.id, "トークン不一致");
            return Err(AppError::TokenMismatch);
        }

        let issued_at = user.reset_token_issued_at.ok_or_else(|| {
            tracing::warn!(user_id = %user.id, "発行時刻のないトークン");
            AppError::TokenExpired
        })?;

        let expires_at = issued_at
            .checked_add(self.settings.reset_token_ttl)
            .ok_or_else(|| {
                tracing::error!(user_id = %user.id, "リセットトークン有効期限の計算でオーバーフロー");
                AppError::TokenExpired
            })?;

        if self.clock.now() > expires_at {
            tracing::warn!(user_id = %user.id, "期限切れトークン");
            return Err(AppError::TokenExpired);
        }

        if self
            .hasher
            .verify_async(new_password.to_string(), user.password_hash.clone())
            .await?
        {
            tracing::warn!(user_id = %user.id, "以前と同じパスワード");
            return Err(AppError::PasswordReused);
        }

        let password_hash = self.hasher.hash_async(new_password.to_string()).await?;

        // 検証後に別リクエストで上書き・使用された場合は更新しない
        let updated = self
            .store
            .complete_password_reset(user.id, &token_hash, &password_hash)
            .await?;
        if !updated {
            tracing::warn!(user_id = %user.id, "トークンが既に無効化されている");
            return Err(AppError::TokenNotFound);
        }

        tracing::info!(user_id = %user.id, "パスワードリセット完了");

        Ok(())
    }

    /// リセットURLを構築
    fn build_reset_url(&self, token: &str) -> Option<String> {
        self.settings
            .reset_url_base
            .as_ref()
            .map(|base| format!("{}?token={}", base, token))
    }
}
