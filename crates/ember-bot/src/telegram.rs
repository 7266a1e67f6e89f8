//! Thin Telegram Bot API client over reqwest — only the handful of methods
//! the relay needs.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use ember_types::models::TelegramUser;

pub struct BotApi {
    http: reqwest::Client,
    base: String,
    file_base: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    /// Telegram sends several sizes of the same photo.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub voice: Option<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

impl BotApi {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{}", token),
            file_base: format!("https://api.telegram.org/file/bot{}", token),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        let envelope: ApiEnvelope<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(payload)
            .send()
            .await?
            .json()
            .await
            .with_context(|| format!("decoding {} response", method))?;

        if !envelope.ok {
            bail!("{} failed: {}", method, envelope.description.unwrap_or_default());
        }
        envelope
            .result
            .with_context(|| format!("{} returned ok without a result", method))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: Value = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    /// Send a message with a single inline web-app button.
    pub async fn send_webapp_button(
        &self,
        chat_id: i64,
        text: &str,
        button_text: &str,
        url: &str,
    ) -> Result<()> {
        let _: Value = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": {
                        "inline_keyboard": [[
                            { "text": button_text, "web_app": { "url": url } }
                        ]]
                    },
                }),
            )
            .await?;
        Ok(())
    }

    /// Resolve a file_id to a fetchable URL.
    pub async fn file_url(&self, file_id: &str) -> Result<String> {
        let file: File = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let path = file.file_path.context("getFile returned no file_path")?;
        Ok(format!("{}/{}", self.file_base, path))
    }
}
