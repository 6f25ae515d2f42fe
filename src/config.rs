//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::channels::ChatId;
use crate::error::ConfigError;

/// Path the webhook server listens on; Telegram is pointed at `<base>/api/webhook`.
pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Bot configuration, built from environment variables.
#[derive(Debug)]
pub struct BotConfig {
    /// Bot API token.
    pub bot_token: SecretString,
    /// Chat that receives submissions for review.
    pub moderation_chat_id: ChatId,
    /// Port for the webhook server.
    pub port: u16,
    /// Public base URL. When set the bot runs in webhook mode, otherwise it long-polls.
    pub public_url: Option<String>,
    /// Directory holding `hello.png` and `thanks.png`.
    pub assets_dir: PathBuf,
}

impl BotConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()))?;

        let moderation_chat_id = var("MODERATION_CHAT_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("MODERATION_CHAT_ID".into()))?
            .parse::<ChatId>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "MODERATION_CHAT_ID".into(),
                message: e.to_string(),
            })?;

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: e.to_string(),
            })?,
            None => 3000,
        };

        let public_url = var("WEBHOOK_URL")
            .or_else(|| var("VERCEL_URL").map(|host| format!("https://{host}")))
            .map(|url| url.trim_end_matches('/').to_string());

        let assets_dir = var("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./public"));

        Ok(Self {
            bot_token,
            moderation_chat_id,
            port,
            public_url,
            assets_dir,
        })
    }

    /// Full webhook URL, if webhook mode is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{base}{WEBHOOK_PATH}"))
    }
}
