//! Review API port and response validation.

use async_trait::async_trait;
use serde_json::Value;

use crate::{config::EmptyHomeworksPolicy, domain::Cursor, errors::Error, Result};

/// Port for the remote homework status endpoint.
///
/// Implementations return the decoded JSON body of a 200 response and map
/// everything else (non-200, network failure) to `Error::EndpointUnavailable`.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Endpoint URL, for logs.
    fn endpoint(&self) -> &str;

    async fn fetch(&self, from_date: Cursor) -> Result<Value>;
}

/// Check the payload shape and return its `homeworks` array.
///
/// An empty array is "no news" under `EmptyHomeworksPolicy::Ignore`.
pub fn validate_response(response: &Value, policy: EmptyHomeworksPolicy) -> Result<&[Value]> {
    let Some(obj) = response.as_object() else {
        return Err(Error::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(response)
        )));
    };

    let Some(homeworks) = obj.get("homeworks") else {
        return Err(Error::MalformedResponse(
            "response has no `homeworks` key".to_string(),
        ));
    };

    let Some(list) = homeworks.as_array() else {
        return Err(Error::MalformedResponse(format!(
            "`homeworks` is {}, expected an array",
            json_kind(homeworks)
        )));
    };

    if list.is_empty() && policy == EmptyHomeworksPolicy::Error {
        return Err(Error::MalformedResponse(
            "`homeworks` is empty".to_string(),
        ));
    }

    Ok(list.as_slice())
}

/// Server-provided cursor for the next request (`current_date`).
pub fn response_cursor(response: &Value) -> Option<Cursor> {
    response.get("current_date").and_then(Value::as_i64)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
