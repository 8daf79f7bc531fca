use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use authgate::config::Config;
use authgate::repositories::{InMemoryUserStore, PgUserStore, UserStore};
use authgate::router::create_router;
use authgate::services::{EmailSender, LogEmailSender};
use authgate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化（JSON形式、環境変数でレベル制御）
    init_tracing();

    tracing::info!("authgate 起動中...");

    // 設定読み込み（不正な値はここで失敗させる）
    let config = Config::load().map_err(|e| {
        tracing::error!(error = ?e, "設定の読み込みに失敗");
        anyhow::anyhow!("Failed to load config: {}", e)
    })?;

    tracing::info!(host = %config.host, port = %config.port, "設定読み込み完了");

    // サーバーアドレスを先に構築（config が move される前に）
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            tracing::error!(error = ?e, "アドレスのパースに失敗");
            anyhow::anyhow!("Failed to parse address: {}", e)
        })?;

    let store = create_store(&config).await?;
    let email_sender = create_email_sender(&config)?;

    // AppState 構築
    let state = AppState::new(config, store, email_sender).map_err(|e| {
        tracing::error!(error = ?e, "AppState の構築に失敗");
        anyhow::anyhow!("Failed to create AppState: {}", e)
    })?;

    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(error = ?e, addr = %addr, "ポートのバインドに失敗");
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!(addr = %addr, "サーバー起動");

    // Graceful shutdown 対応
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "サーバーエラー");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    tracing::info!("サーバー終了");

    Ok(())
}

/// tracing の初期化（JSON形式）
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,authgate=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// ユーザーストアの選択
///
/// DATABASE_URL 未設定時はインメモリストア（再起動でデータは消える）
async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL 未設定: インメモリストアで起動");
        return Ok(Arc::new(InMemoryUserStore::new()));
    };

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "データベース接続に失敗");
            anyhow::anyhow!("Failed to connect to database: {}", e)
        })?;

    tracing::info!("データベース接続完了");

    Ok(Arc::new(PgUserStore::new(db_pool)))
}

/// メール送信者の選択
#[cfg(feature = "email")]
fn create_email_sender(config: &Config) -> anyhow::Result<Arc<dyn EmailSender>> {
    use authgate::services::email::SmtpEmailSender;

    match (
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
        &config.smtp_from_address,
    ) {
        (Some(host), Some(username), Some(password), Some(from)) => {
            let sender = SmtpEmailSender::new(
                host,
                config.smtp_port,
                username.expose_secret().clone(),
                password.expose_secret().clone(),
                from,
            )
            .map_err(|e| {
                tracing::error!(error = %e, "SMTP 送信者の初期化に失敗");
                anyhow::anyhow!("Failed to create SMTP sender: {}", e)
            })?;
            tracing::info!(smtp_host = %host, "SMTP メール送信を使用");
            Ok(Arc::new(sender))
        }
        _ => {
            tracing::warn!("SMTP 未設定: メールはログ出力のみ");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

/// メール送信者の選択
#[cfg(not(feature = "email"))]
fn create_email_sender(config: &Config) -> anyhow::Result<Arc<dyn EmailSender>> {
    if config.smtp_configured() {
        tracing::warn!("SMTP 設定がありますが email 機能が無効です: メールはログ出力のみ");
    } else {
        tracing::warn!("SMTP 未設定: メールはログ出力のみ");
    }
    Ok(Arc::new(LogEmailSender))
}

/// Graceful shutdown シグナル待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Ctrl+C ハンドラーのインストールに失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "SIGTERM ハンドラーのインストールに失敗");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, starting graceful shutdown");
        }
    }
}
