//! Out-of-band photo intake: long-polls Telegram for uploads and relays a
//! fetchable URL to the profile endpoint. Shares no memory with the server;
//! everything goes through the REST surface.

mod telegram;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use ember_types::models::TelegramUser;

use crate::telegram::{BotApi, Message, PhotoSize};

const MAX_VOICE_BYTES: i64 = 10 * 1024 * 1024;
const POLL_TIMEOUT_SECS: u64 = 30;

struct Relay {
    api: BotApi,
    http: reqwest::Client,
    bot_token: String,
    backend_url: String,
    webapp_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ember_bot=debug".into()),
        )
        .init();

    let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;
    let backend_url =
        std::env::var("EMBER_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
    let webapp_url =
        std::env::var("EMBER_WEBAPP_URL").unwrap_or_else(|_| "https://example.com".into());

    let relay = Relay {
        api: BotApi::new(&bot_token),
        http: reqwest::Client::new(),
        bot_token,
        backend_url,
        webapp_url,
    };

    info!("Ember bot polling for updates");
    let mut offset = 0i64;
    loop {
        match relay.api.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        if let Err(e) = relay.handle_message(message).await {
                            warn!("Failed to handle update: {:#}", e);
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Poll error: {:#}", e);
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}

impl Relay {
    async fn handle_message(&self, message: Message) -> Result<()> {
        let chat_id = message.chat.id;

        if message
            .text
            .as_deref()
            .is_some_and(|t| t.starts_with("/start"))
        {
            self.api
                .send_webapp_button(
                    chat_id,
                    "💘 Welcome to Ember!",
                    "🚀 Open the app",
                    &self.webapp_url,
                )
                .await?;
            return Ok(());
        }

        if let Some(photos) = &message.photo {
            return self.relay_photo(chat_id, message.from.as_ref(), photos).await;
        }

        if let Some(voice) = &message.voice {
            if voice.file_size.unwrap_or(0) > MAX_VOICE_BYTES {
                self.api
                    .send_message(chat_id, "❌ File is too large (max 10 MB)")
                    .await?;
                return Ok(());
            }
            self.api.file_url(&voice.file_id).await?;
            self.api.send_message(chat_id, "✅ Audio processed").await?;
        }

        Ok(())
    }

    /// Resolve the upload to a URL and push it to the profile endpoint,
    /// authenticating as the sender. The relay holds the same credential the
    /// verifier derives its key from, so it signs its own init data instead
    /// of needing a separate auth path.
    async fn relay_photo(
        &self,
        chat_id: i64,
        from: Option<&TelegramUser>,
        photos: &[PhotoSize],
    ) -> Result<()> {
        let Some(sender) = from else {
            return Ok(());
        };
        let Some(best) = photos.iter().max_by_key(|p| p.width * p.height) else {
            return Ok(());
        };

        let photo_url = self.api.file_url(&best.file_id).await?;
        let init_data = ember_auth::sign_init_data(
            sender,
            chrono::Utc::now().timestamp(),
            &self.bot_token,
        )?;

        // Upsert the sender first so a photo sent before the Mini App was
        // ever opened still lands on a profile.
        self.http
            .post(format!("{}/api/auth/login", self.backend_url))
            .header("x-telegram-init-data", &init_data)
            .send()
            .await?
            .error_for_status()?;

        let response = self
            .http
            .post(format!("{}/api/user/add-photo", self.backend_url))
            .header("x-telegram-init-data", init_data)
            .json(&serde_json::json!({ "photo_url": photo_url }))
            .send()
            .await?;

        if response.status().is_success() {
            self.api
                .send_message(chat_id, "✅ Photo added to your profile!")
                .await?;
        } else {
            warn!("add-photo relay failed for user {}: {}", sender.id, response.status());
            self.api
                .send_message(chat_id, "❌ Could not add the photo")
                .await?;
        }
        Ok(())
    }
}
