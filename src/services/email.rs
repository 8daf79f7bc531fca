use async_trait::async_trait;

/// メール送信エラー
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("メッセージの構築に失敗: {0}")]
    Message(String),

    #[error("メール送信に失敗: {0}")]
    Transport(String),
}

/// 送信するメールのテンプレート
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    /// パスワードリセット（平文トークンを含む）
    PasswordReset {
        name: String,
        token: String,
        reset_url: Option<String>,
    },
}

impl EmailTemplate {
    /// テンプレート名（ログ出力用）
    pub fn name(&self) -> &'static str {
        match self {
            Self::PasswordReset { .. } => "password_reset",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::PasswordReset { .. } => "パスワードの再設定",
        }
    }

    /// 本文（プレーンテキスト）を生成
    pub fn render_body(&self) -> String {
        match self {
            Self::PasswordReset {
                name,
                token,
                reset_url,
            } => {
                let action = match reset_url {
                    Some(url) => format!("以下のリンクからパスワードを再設定してください。\n{}", url),
                    None => format!("以下のコードを入力してパスワードを再設定してください。\n{}", token),
                };
                format!(
                    "{} 様\n\nパスワード再設定のリクエストを受け付けました。\n{}\n\n\
                     心当たりがない場合は、このメールを破棄してください。\n",
                    name, action
                )
            }
        }
    }
}

/// メール送信のインターフェース
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, template: &EmailTemplate) -> Result<(), EmailError>;
}

/// ログ出力のみのメール送信（開発環境用）
///
/// # Security
/// 本文（トークンを含む）はログに出力しない
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, template: &EmailTemplate) -> Result<(), EmailError> {
        tracing::info!(
            to = %to,
            template = template.name(),
            "メール送信（開発モード）"
        );
        Ok(())
    }
}

#[cfg(feature = "email")]
pub use smtp::SmtpEmailSender;

#[cfg(feature = "email")]
mod smtp {
    use async_trait::async_trait;
    use lettre::message::{Mailbox, header::ContentType};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::{EmailError, EmailSender, EmailTemplate};

    /// SMTP によるメール送信（lettre）
    #[derive(Clone)]
    pub struct SmtpEmailSender {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    }

    impl SmtpEmailSender {
        /// 新しい SmtpEmailSender を作成（STARTTLS）
        pub fn new(
            host: &str,
            port: u16,
            username: String,
            password: String,
            from_address: &str,
        ) -> Result<Self, EmailError> {
            let from = from_address
                .parse::<Mailbox>()
                .map_err(|e| EmailError::Message(e.to_string()))?;

            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| EmailError::Transport(e.to_string()))?
                .port(port)
                .credentials(Credentials::new(username, password))
                .build();

            Ok(Self { transport, from })
        }
    }

    #[async_trait]
    impl EmailSender for SmtpEmailSender {
        async fn send(&self, to: &str, template: &EmailTemplate) -> Result<(), EmailError> {
            let to = to
                .parse::<Mailbox>()
                .map_err(|e| EmailError::Message(e.to_string()))?;

            let message = Message::builder()
                .from(self.from.clone())
                .to(to.clone())
                .subject(template.subject())
                .header(ContentType::TEXT_PLAIN)
                .body(template.render_body())
                .map_err(|e| EmailError::Message(e.to_string()))?;

            self.transport
                .send(message)
                .await
                .map_err(|e| EmailError::Transport(e.to_string()))?;

            tracing::info!(to = %to, template = template.name(), "メール送信完了");

            Ok(())
        }
    }
}

#[cfg(test)]
pub use testing::{CapturingEmailSender, FailingEmailSender};


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_token_code() {
        let template = EmailTemplate::PasswordReset {
            name: "Test User".to_string(),
            token: "abc123".to_string(),
            reset_url: None,
        };
        let body = template.render_body();
        assert!(body.contains("Test User"));
        assert!(body.contains("abc123"));
        assert_eq!(template.name(), "password_reset");
    }

    #[test]
    fn test_render_with_reset_url() {
        let template = EmailTemplate::PasswordReset {
            name: "Test User".to_string(),
            token: "abc123".to_string(),
            reset_url: Some("https://app.example.com/reset?token=abc123".to_string()),
        };
        let body = template.render_body();
        assert!(body.contains("https://app.example.com/reset?token=abc123"));
    }

    #[tokio::test]
    async fn test_log_sender_succeeds() {
        let template = EmailTemplate::PasswordReset {
            name: "Test User".to_string(),
            token: "abc123".to_string(),
            reset_url: None,
        };
        assert!(LogEmailSender.send("test@example.com", &template).await.is_ok());
    }
}
