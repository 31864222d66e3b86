//! Telegram adapter (teloxide).
//!
//! Implements the `hwr-core` MessagingPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
};

use tokio::time::sleep;

use hwr_core::{
    domain::ChatId,
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Log which bot we are sending as; failure here is not fatal.
    pub async fn log_identity(&self) {
        match self.bot.get_me().await {
            Ok(me) => tracing::info!("Sending as @{}", me.username()),
            Err(e) => tracing::warn!("Could not fetch bot identity: {e}"),
        }
    }

    fn recipient(chat_id: &ChatId) -> Recipient {
        match chat_id {
            ChatId::Id(id) => Recipient::Id(teloxide::types::ChatId(*id)),
            ChatId::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::MessageSend(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::warn!("Telegram flood control, retrying after {d:?}");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn max_message_len(&self) -> usize {
        TELEGRAM_MESSAGE_LIMIT
    }

    async fn send_html(&self, chat_id: &ChatId, html: &str) -> Result<()> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::recipient(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;
        tracing::debug!("Delivered message {} to {}", msg.id.0, chat_id);
        Ok(())
    }
}
