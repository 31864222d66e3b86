use std::{env, fmt, fs, path::Path, time::Duration};

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The three secrets the relay cannot run without.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &redact(&self.practicum_token))
            .field("telegram_token", &redact(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    /// Env var names of the credentials that are empty or whitespace-only.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("PRACTICUM_TOKEN", &self.practicum_token),
            ("TELEGRAM_TOKEN", &self.telegram_token),
            ("TELEGRAM_CHAT_ID", &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

/// Check that every credential is present.
///
/// Logs at critical severity and returns `false` if any is missing; the caller
/// must refuse to start.
pub fn check_tokens(credentials: &Credentials) -> bool {
    let missing = credentials.missing();
    if missing.is_empty() {
        return true;
    }
    tracing::error!(
        severity = "critical",
        "One or more tokens are missing: {}",
        missing.join(", ")
    );
    false
}

/// What an empty `homeworks` array means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyHomeworksPolicy {
    /// Nothing was updated since the cursor; stay quiet.
    #[default]
    Ignore,
    /// Report it as a malformed response.
    Error,
}

impl EmptyHomeworksPolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ignore" | "" => Some(Self::Ignore),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Typed configuration for the relay, sourced from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,

    // Review API
    pub endpoint: String,
    pub request_timeout: Duration,
    pub initial_from_date: Option<i64>,
    pub empty_homeworks: EmptyHomeworksPolicy,

    // Loop
    pub poll_interval: Duration,
}

impl Config {
    /// Load `.env` (without overriding the process environment), then read the environment.
    pub fn load() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// Missing credentials are not an error here; `check_tokens` decides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Required (checked later). Lowercase names are the legacy deployment's.
        let credentials = Credentials {
            practicum_token: first_of(&lookup, &["PRACTICUM_TOKEN", "praktikum_token"]),
            telegram_token: first_of(&lookup, &["TELEGRAM_TOKEN", "telegram_token"]),
            telegram_chat_id: first_of(&lookup, &["TELEGRAM_CHAT_ID", "telegram_chat_id"]),
        };

        let endpoint = lookup("PRACTICUM_ENDPOINT")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let poll_interval = Duration::from_secs(
            parse_u64(&lookup, "POLL_INTERVAL_SECS")?.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        );
        let request_timeout = Duration::from_secs(
            parse_u64(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let initial_from_date = match lookup("INITIAL_FROM_DATE").and_then(non_empty) {
            Some(v) => Some(v.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("INITIAL_FROM_DATE must be a unix timestamp, got {v:?}"))
            })?),
            None => None,
        };

        let empty_homeworks = match lookup("EMPTY_HOMEWORKS") {
            Some(v) => EmptyHomeworksPolicy::parse(&v).ok_or_else(|| {
                Error::Config(format!(
                    "EMPTY_HOMEWORKS must be `ignore` or `error`, got {v:?}"
                ))
            })?,
            None => EmptyHomeworksPolicy::default(),
        };

        Ok(Self {
            credentials,
            endpoint,
            request_timeout,
            initial_from_date,
            empty_homeworks,
            poll_interval,
        })
    }

    /// Destination chat parsed from `TELEGRAM_CHAT_ID`.
    pub fn chat_id(&self) -> Result<ChatId> {
        ChatId::parse(&self.credentials.telegram_chat_id).ok_or_else(|| {
            Error::Config(format!(
                "TELEGRAM_CHAT_ID must be a numeric id or @username, got {:?}",
                self.credentials.telegram_chat_id
            ))
        })
    }
}

fn first_of(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| lookup(k).and_then(non_empty))
        .unwrap_or_default()
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(v) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    match v.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(Error::Config(format!(
            "{key} must be a positive integer, got {v:?}"
        ))),
    }
}

/// Copy `.env` from the working directory into the process environment.
///
/// Existing variables win. Call before `logging::init` so `RUST_LOG` from `.env` applies.
pub fn load_dotenv() {
    load_dotenv_if_present(Path::new(".env"));
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
