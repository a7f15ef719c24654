//! Telegram Bot API sink (`sendMessage`).

use std::time::Duration;

use tracing::{info, instrument, warn};

use super::{DeliverySink, RenderMode};
use crate::error::{ScanError, ScanResult};
use crate::settings::Settings;

pub struct TelegramSink {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramSink {
    /// Create a sink for `bot_token` against `api_base` (normally https://api.telegram.org).
    pub fn new(api_base: &str, bot_token: &str, timeout: Duration) -> ScanResult<Self> {
        if bot_token.trim().is_empty() {
            return Err(ScanError::MissingCredential("BOT_TOKEN"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> ScanResult<Self> {
        Self::new(
            &settings.endpoints.telegram_api_base,
            settings.bot_token()?,
            settings.request_timeout(),
        )
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

/// Form fields for one `sendMessage` call. `text` is the rendered HTML report.
pub fn message_form(destination: &str, text: &str, mode: RenderMode) -> Vec<(&'static str, String)> {
    let mut form = vec![("chat_id", destination.to_string()), ("text", mode.prepare(text).into_owned())];
    if let Some(parse_mode) = mode.parse_mode() {
        form.push(("parse_mode", parse_mode.to_string()));
    }
    form
}

#[async_trait::async_trait]
impl DeliverySink for TelegramSink {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn deliver(&self, destination: &str, text: &str, mode: RenderMode) -> ScanResult<()> {
        if destination.trim().is_empty() {
            return Err(ScanError::MissingCredential("CHAT_ID_VIP"));
        }

        let response = self
            .client
            .post(self.send_url())
            .form(&message_form(destination, text, mode))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Telegram explains rejections (bad markup, unknown chat) in the body
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %detail, "Telegram rejected message");
            return Err(ScanError::Delivery(format!("HTTP {}: {}", status.as_u16(), detail)));
        }

        info!("Message sent to Telegram");
        Ok(())
    }
}
