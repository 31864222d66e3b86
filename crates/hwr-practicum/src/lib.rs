//! Review API adapter (reqwest).
//!
//! `GET <endpoint>?from_date=<cursor>` with `Authorization: OAuth <token>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde_json::Value;

use hwr_core::{
    domain::Cursor, errors::Error, formatting::truncate_chars, status::StatusSource, Result,
};

#[derive(Clone)]
pub struct PracticumClient {
    endpoint: String,
    token: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl PracticumClient {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            token: token.into(),
            http,
        })
    }

    fn unavailable(&self, detail: String) -> Error {
        let err = Error::EndpointUnavailable {
            endpoint: self.endpoint.clone(),
            detail,
        };
        tracing::error!("{err}");
        err
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, from_date: Cursor) -> Result<Value> {
        let resp = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            // The URL carries `from_date`; keep it out so repeated failures read the same.
            .map_err(|e| self.unavailable(format!("request failed: {}", e.without_url())))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.unavailable(format!(
                "HTTP {status}: {}",
                truncate_chars(body.trim(), 200)
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| {
                self.unavailable(format!("reading response body: {}", e.without_url()))
            })?;

        tracing::debug!("GET {} -> {} ({} bytes)", self.endpoint, status, body.len());

        serde_json::from_str(&body).map_err(|e| {
            Error::MalformedResponse(format!(
                "body is not JSON ({e}): {}",
                truncate_chars(body.trim(), 200)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Port 1 is reserved and unbound, so connections are refused.
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api/user_api/homework_statuses/";

    /// Serve one canned HTTP response; the raw request head comes back on the channel.
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!(
            "http://{}/api/user_api/homework_statuses/",
            listener.local_addr().unwrap()
        );
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());
            stream.write_all(response.as_bytes()).unwrap();
            let _ = stream.flush();
        });

        (url, rx)
    }

    fn client(url: &str) -> PracticumClient {
        PracticumClient::new(url, "tok", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn ok_response_is_decoded_and_request_is_authorized() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"homeworks":[{"homework_name":"proj1","status":"approved"}],"current_date":1000}"#,
        );

        let value = client(&url).fetch(42).await.unwrap();
        assert_eq!(value["current_date"], 1000);
        assert_eq!(value["homeworks"][0]["homework_name"], "proj1");

        let head = request.recv().unwrap();
        let request_line = head.lines().next().unwrap_or_default();
        assert!(
            request_line.starts_with("GET /api/user_api/homework_statuses/?from_date=42 "),
            "{request_line}"
        );
        assert!(
            head.lines()
                .any(|l| l.eq_ignore_ascii_case("authorization: OAuth tok")),
            "{head}"
        );
    }

    #[tokio::test]
    async fn non_ok_status_is_endpoint_unavailable_with_body() {
        let (url, _request) = serve_once("503 Service Unavailable", r#"{"code":"down"}"#);

        match client(&url).fetch(1).await {
            Err(Error::EndpointUnavailable { endpoint, detail }) => {
                assert_eq!(endpoint, url);
                assert!(detail.contains("503"), "{detail}");
                assert!(detail.contains(r#"{"code":"down"}"#), "{detail}");
            }
            other => panic!("expected EndpointUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_status_with_non_json_body_is_malformed() {
        let (url, _request) = serve_once("200 OK", "<html>maintenance</html>");

        match client(&url).fetch(1).await {
            Err(Error::MalformedResponse(msg)) => assert!(msg.contains("maintenance"), "{msg}"),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_endpoint_unavailable() {
        let err = client(UNREACHABLE_URL).fetch(0).await.unwrap_err();

        match &err {
            Error::EndpointUnavailable { endpoint, detail } => {
                assert_eq!(endpoint, UNREACHABLE_URL);
                assert!(detail.starts_with("request failed:"), "{detail}");
            }
            other => panic!("expected EndpointUnavailable, got {other:?}"),
        }
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn network_failures_read_the_same_for_any_cursor() {
        let c = client(UNREACHABLE_URL);
        let first = c.fetch(100).await.unwrap_err().to_string();
        let second = c.fetch(101).await.unwrap_err().to_string();

        assert_eq!(first, second);
        assert!(!first.contains("from_date"), "{first}");
    }

    #[test]
    fn reports_its_endpoint() {
        let c = client(hwr_core::config::DEFAULT_ENDPOINT);
        assert_eq!(c.endpoint(), hwr_core::config::DEFAULT_ENDPOINT);
    }
}
