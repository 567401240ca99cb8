use crate::models::{ForwardOutcome, ForwardRequest, ForwardResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum ForwardError {
    #[error("Request timed out after {0} seconds.")]
    Timeout(u64),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ForwardError {
    fn status(&self) -> u16 {
        match self {
            ForwardError::Timeout(_) => 408,
            ForwardError::Transport(_) => 503,
            ForwardError::Unexpected(_) => 500,
        }
    }
}

/// Relays one request per call to an arbitrary URL. No retries.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
    timeout: Duration,
}

impl Forwarder {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(FORWARD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Never fails: every error is folded into a `ForwardResult::Failed`.
    pub async fn forward(&self, request: &ForwardRequest) -> ForwardOutcome {
        let method = request.effective_method();
        info!(method = %method, url = %request.url, "Forwarding request");

        match self.execute(&method, request).await {
            Ok(outcome) => {
                info!(status = outcome.status, url = %request.url, "Received upstream response");
                outcome
            }
            Err(e) => {
                warn!(error = %e, url = %request.url, "Forwarding failed");
                ForwardOutcome {
                    status: e.status(),
                    result: ForwardResult::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    async fn execute(
        &self,
        method: &str,
        request: &ForwardRequest,
    ) -> Result<ForwardOutcome, ForwardError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| ForwardError::Unexpected(format!("{e} ({method:?})")))?;
        let headers = build_header_map(&request.headers)?;

        let mut request_builder = self.client.request(method, &request.url).headers(headers);

        if !request.body.is_empty() {
            request_builder = match json_payload(&request.headers, &request.body) {
                Some(payload) => request_builder.json(&payload),
                None => request_builder.body(request.body.clone().into_bytes()),
            };
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(ForwardOutcome {
            status,
            result: ForwardResult::Completed {
                status_code: status,
                headers,
                body,
            },
        })
    }

    fn classify(&self, err: reqwest::Error) -> ForwardError {
        if err.is_timeout() {
            ForwardError::Timeout(self.timeout.as_secs())
        } else {
            ForwardError::Transport(describe(&err))
        }
    }
}

fn build_header_map(fields: &Map<String, Value>) -> Result<HeaderMap, ForwardError> {
    let mut headers = HeaderMap::new();

    for (key, value) in fields {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ForwardError::Transport(format!("invalid header name {key:?}: {e}")))?;
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let value = HeaderValue::from_str(&text).map_err(|e| {
            ForwardError::Transport(format!("invalid value for header {key:?}: {e}"))
        })?;
        headers.append(name, value);
    }

    Ok(headers)
}

/// The body as structured JSON, when the caller declared `application/json`
/// and the text parses. `None` means the raw bytes go out as-is.
fn json_payload(fields: &Map<String, Value>, body: &str) -> Option<Value> {
    let is_json = fields
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-type"))
        .and_then(|(_, value)| value.as_str())
        .map(|value| value.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);

    if !is_json {
        return None;
    }

    match serde_json::from_str(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            debug!(error = %e, "Body is not valid JSON, sending raw bytes");
            None
        }
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    for (key, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        map.entry(key.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    map
}

fn describe(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
