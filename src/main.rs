use std::sync::Arc;

use anyhow::Context;
use publisher_intake::bot::IntakeBot;
use publisher_intake::channels::TelegramChannel;
use publisher_intake::config::BotConfig;
use publisher_intake::error::ChannelError;
use publisher_intake::intake::InMemorySessionStore;
use publisher_intake::server::webhook_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    run().await.context("publisher intake bot stopped")?;
    Ok(())
}

async fn run() -> publisher_intake::Result<()> {
    // Refuse to start half-configured.
    let config = BotConfig::from_env()?;

    eprintln!("🤖 Publisher intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Moderation chat: {}", config.moderation_chat_id);
    eprintln!("   Assets: {}", config.assets_dir.display());

    let webhook_url = config.webhook_url();
    let BotConfig {
        bot_token,
        moderation_chat_id,
        port,
        assets_dir,
        ..
    } = config;

    let telegram = Arc::new(TelegramChannel::new(bot_token));
    telegram.health_check().await?;

    let bot = Arc::new(IntakeBot::new(
        telegram.clone(),
        Arc::new(InMemorySessionStore::new()),
        moderation_chat_id,
        assets_dir,
    ));

    match webhook_url {
        Some(url) => {
            eprintln!("   Mode: webhook ({url})");
            telegram.set_webhook(&url).await?;

            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .map_err(|e| ChannelError::StartupFailed {
                    name: "webhook".into(),
                    reason: format!("bind port {port}: {e}"),
                })?;
            tracing::info!(port, "Webhook server started");
            axum::serve(listener, webhook_routes(bot))
                .await
                .map_err(|e| ChannelError::StartupFailed {
                    name: "webhook".into(),
                    reason: e.to_string(),
                })?;
        }
        None => {
            eprintln!("   Mode: long-polling\n");
            telegram.delete_webhook().await?;
            bot.run(telegram.start()).await;
        }
    }

    Ok(())
}
