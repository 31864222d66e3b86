use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound messenger port.
///
/// Implementations map delivery failures to `Error::MessageSend`.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Maximum message length the messenger accepts.
    fn max_message_len(&self) -> usize;

    async fn send_html(&self, chat_id: &ChatId, html: &str) -> Result<()>;
}
