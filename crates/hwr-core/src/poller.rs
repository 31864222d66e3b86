//! The poll loop: fetch -> validate -> render -> dedup -> notify -> sleep.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{Config, EmptyHomeworksPolicy},
    domain::{ChatId, Cursor},
    formatting::{escape_html, truncate_chars},
    messaging::port::MessagingPort,
    status::{response_cursor, validate_response, StatusSource},
    verdict::render_verdict,
    Result,
};

/// State carried across iterations.
///
/// The destination chat is fixed at construction; the cursor and the two
/// last-seen slots are the only mutable state of the relay. API and bot tokens
/// stay with the adapters that use them.
#[derive(Debug)]
pub struct RelaySession {
    chat_id: ChatId,
    cursor: Option<Cursor>,
    last_status: Option<String>,
    last_error: Option<String>,
}

impl RelaySession {
    pub fn new(chat_id: ChatId, cursor: Option<Cursor>) -> Self {
        Self {
            chat_id,
            cursor,
            last_status: None,
            last_error: None,
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Successful result of one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Rendered verdict of the most recent homework.
    Verdict(String),
    /// Nothing changed since the cursor.
    NoHomeworks,
}

pub struct Poller {
    source: Arc<dyn StatusSource>,
    messenger: Arc<dyn MessagingPort>,
    session: RelaySession,
    empty_homeworks: EmptyHomeworksPolicy,
    interval: Duration,
}

impl Poller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        messenger: Arc<dyn MessagingPort>,
        session: RelaySession,
        empty_homeworks: EmptyHomeworksPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            messenger,
            session,
            empty_homeworks,
            interval,
        }
    }

    /// Build a poller from loaded config. The cursor starts at
    /// `INITIAL_FROM_DATE` or now.
    pub fn from_config(
        cfg: &Config,
        chat_id: ChatId,
        source: Arc<dyn StatusSource>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        let cursor = cfg.initial_from_date.unwrap_or_else(now_unix);
        Self::new(
            source,
            messenger,
            RelaySession::new(chat_id, Some(cursor)),
            cfg.empty_homeworks,
            cfg.poll_interval,
        )
    }

    pub fn session(&self) -> &RelaySession {
        &self.session
    }

    /// Fetch the raw payload starting at the cursor (or now, if there is none).
    pub async fn fetch_status(&self, cursor: Option<Cursor>) -> Result<Value> {
        let from_date = cursor.unwrap_or_else(now_unix);
        tracing::debug!("Fetching {} from_date={}", self.source.endpoint(), from_date);
        self.source.fetch(from_date).await
    }

    /// One fetch/validate/render pass.
    ///
    /// The cursor advances as soon as the payload validates, so a record that
    /// fails to render is reported once and not fetched again.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        // The status source logs its own failures.
        let response = self.fetch_status(self.session.cursor).await?;
        let homeworks = validate_response(&response, self.empty_homeworks)
            .inspect_err(|e| tracing::error!("{e}"))?;

        self.session.cursor = response_cursor(&response);

        let Some(latest) = homeworks.first() else {
            return Ok(PollOutcome::NoHomeworks);
        };
        let verdict = render_verdict(latest).inspect_err(|e| tracing::error!("{e}"))?;
        Ok(PollOutcome::Verdict(verdict))
    }

    /// Turn a poll result into at most one notification.
    pub async fn report(&mut self, result: Result<PollOutcome>) {
        match result {
            Ok(PollOutcome::Verdict(message)) => {
                if self.session.last_status.as_deref() == Some(message.as_str()) {
                    tracing::debug!("No new statuses");
                    return;
                }
                self.session.last_status = Some(message.clone());
                self.send_notification(&message).await;
            }
            Ok(PollOutcome::NoHomeworks) => {
                tracing::debug!("No new statuses");
            }
            Err(e) => {
                if !e.is_recoverable() {
                    tracing::warn!("Unexpected error kind in poll loop: {e}");
                }
                let message = format!("Program failure: {e}");
                if self.session.last_error.as_deref() == Some(message.as_str()) {
                    tracing::debug!("Error repeats, not reporting again: {e}");
                    return;
                }
                tracing::info!("Reporting failure: {e}");
                self.session.last_error = Some(message.clone());
                self.send_notification(&message).await;
            }
        }
    }

    /// Poll once and report the result.
    pub async fn tick(&mut self) {
        let result = self.poll_once().await;
        self.report(result).await;
    }

    /// Deliver a message to the configured chat. Failures are logged, never returned.
    pub async fn send_notification(&self, message: &str) {
        let html = fit_html(message, self.messenger.max_message_len());
        match self
            .messenger
            .send_html(&self.session.chat_id, &html)
            .await
        {
            Ok(_) => tracing::info!("Message sent to {}: {}", self.session.chat_id, message),
            Err(e) => tracing::error!("Message not sent. Reason: {e}"),
        }
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run_forever(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            "Polling {} every {}s",
            self.source.endpoint(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = self.tick() => {}
                _ = shutdown.cancelled() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        tracing::info!("Poll loop stopped");
    }
}

fn now_unix() -> Cursor {
    chrono::Utc::now().timestamp()
}

fn fit_html(message: &str, max_len: usize) -> String {
    let html = escape_html(message);
    if html.chars().count() <= max_len {
        return html;
    }
    // Escaping grows text by at most 6x (`"` -> `&quot;`).
    escape_html(&truncate_chars(message, max_len.saturating_sub(3) / 6))
}
