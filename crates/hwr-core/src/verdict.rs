//! Homework record -> human-readable verdict.

use serde::Deserialize;
use serde_json::Value;

use crate::{errors::Error, Result};

/// Review status reported by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkStatus {
    Reviewing,
    Approved,
    Rejected,
}

impl HomeworkStatus {
    pub fn phrase(self) -> &'static str {
        match self {
            HomeworkStatus::Reviewing => "The work was taken for review.",
            HomeworkStatus::Approved => "The work was reviewed, no issues. Hooray!",
            HomeworkStatus::Rejected => "The work was reviewed, the reviewer has remarks.",
        }
    }
}

/// Render the verdict sentence for one homework record.
///
/// `null` fields count as absent.
pub fn render_verdict(record: &Value) -> Result<String> {
    let name = match record.get("homework_name") {
        None | Some(Value::Null) => return Err(Error::MissingField("homework_name")),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let status = match record.get("status") {
        None | Some(Value::Null) => return Err(Error::MissingField("status")),
        Some(v) => HomeworkStatus::deserialize(v).map_err(|_| {
            Error::UnknownStatus(match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })?,
    };

    Ok(format!(
        "Status of homework \"{name}\" changed. {}",
        status.phrase()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_each_status() {
        for (status, phrase) in [
            ("reviewing", HomeworkStatus::Reviewing.phrase()),
            ("approved", HomeworkStatus::Approved.phrase()),
            ("rejected", HomeworkStatus::Rejected.phrase()),
        ] {
            let msg =
                render_verdict(&json!({"homework_name": "proj1", "status": status})).unwrap();
            assert!(msg.contains("proj1"), "{msg}");
            assert!(msg.contains(phrase), "{msg}");
        }
    }

    #[test]
    fn same_input_same_output() {
        let rec = json!({"homework_name": "hw", "status": "approved", "id": 7});
        assert_eq!(render_verdict(&rec).unwrap(), render_verdict(&rec).unwrap());
    }

    #[test]
    fn missing_fields() {
        assert!(matches!(
            render_verdict(&json!({"status": "approved"})),
            Err(Error::MissingField("homework_name"))
        ));
        assert!(matches!(
            render_verdict(&json!({"homework_name": "x"})),
            Err(Error::MissingField("status"))
        ));
        assert!(matches!(
            render_verdict(&json!({"homework_name": "x", "status": null})),
            Err(Error::MissingField("status"))
        ));
    }

    #[test]
    fn unknown_status() {
        match render_verdict(&json!({"homework_name": "x", "status": "lost"})) {
            Err(Error::UnknownStatus(s)) => assert_eq!(s, "lost"),
            other => panic!("expected unknown status, got {other:?}"),
        }
        assert!(matches!(
            render_verdict(&json!({"homework_name": "x", "status": 3})),
            Err(Error::UnknownStatus(_))
        ));
    }
}
