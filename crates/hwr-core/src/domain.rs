use std::fmt;

/// Telegram chat target: numeric chat id or public `@username`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    /// Parse the configured chat identifier. Returns `None` for empty or unusable input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Some(ChatId::Id(id));
        }
        let name = raw.strip_prefix('@')?;
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return None;
        }
        Some(ChatId::Username(raw.to_string()))
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

/// Poll cursor: unix timestamp passed as `from_date`.
pub type Cursor = i64;
