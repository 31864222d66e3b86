/// Core error type for the relay.
///
/// Adapter crates map their library errors into this type so the poll loop
/// can tell fatal startup failures from recoverable per-iteration ones.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("endpoint {endpoint} is unavailable: {detail}")]
    EndpointUnavailable { endpoint: String, detail: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("homework record has no `{0}` field")]
    MissingField(&'static str),

    #[error("unknown homework status: {0}")]
    UnknownStatus(String),

    #[error("message not sent: {0}")]
    MessageSend(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Whether the poll loop may report this failure and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EndpointUnavailable { .. }
                | Error::MalformedResponse(_)
                | Error::MissingField(_)
                | Error::UnknownStatus(_)
                | Error::MessageSend(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_config_and_ambient_errors_are_fatal() {
        assert!(!Error::Config("x".to_string()).is_recoverable());
        assert!(!Error::External("x".to_string()).is_recoverable());
        assert!(Error::MissingField("status").is_recoverable());
        assert!(Error::EndpointUnavailable {
            endpoint: "http://x".to_string(),
            detail: "503".to_string(),
        }
        .is_recoverable());
    }

    #[test]
    fn endpoint_error_names_the_endpoint() {
        let e = Error::EndpointUnavailable {
            endpoint: "https://example.test/api".to_string(),
            detail: "HTTP 503".to_string(),
        };
        let s = e.to_string();
        assert!(s.contains("https://example.test/api"));
        assert!(s.contains("503"));
    }
}
