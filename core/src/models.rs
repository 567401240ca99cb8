use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Upper bound on the number of stored history entries.
pub const MAX_HISTORY_SIZE: usize = 20;

/// A named, reusable request template. `headers` is kept as the text the
/// user typed so it can be put back into an editor unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDefinition {
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub url: String,
    #[serde(default = "default_method", deserialize_with = "deserialize_nullable_method")]
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_headers_text")]
    pub headers: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub body: String,
    #[serde(default, deserialize_with = "deserialize_nullable_bool")]
    pub proxy: bool,
}

impl Default for RequestDefinition {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: default_method(),
            headers: String::new(),
            body: String::new(),
            proxy: false,
        }
    }
}

/// One forwarding attempt, parameters only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub url: String,
    #[serde(default = "default_method", deserialize_with = "deserialize_nullable_method")]
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_headers_text")]
    pub headers: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub body: String,
    #[serde(default, deserialize_with = "deserialize_nullable_bool")]
    pub proxy: bool,
}

impl HistoryEntry {
    pub fn from_request(request: &ForwardRequest, timestamp: String) -> Self {
        let headers = if request.headers.is_empty() {
            String::new()
        } else {
            Value::Object(request.headers.clone()).to_string()
        };

        Self {
            timestamp,
            url: request.url.clone(),
            method: request.effective_method(),
            headers,
            body: request.body.clone(),
            proxy: request.proxy,
        }
    }
}

/// Parameters of a call to relay. The url is assumed to be validated by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardRequest {
    pub url: String,
    pub method: String,
    pub headers: Map<String, Value>,
    pub body: String,
    pub proxy: bool,
}

impl ForwardRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Upper-cased method, `GET` when none was given.
    pub fn effective_method(&self) -> String {
        let method = self.method.trim();
        if method.is_empty() {
            default_method()
        } else {
            method.to_uppercase()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForwardResult {
    Completed {
        status_code: u16,
        headers: HashMap<String, String>,
        body: String,
    },
    Failed {
        error: String,
    },
}

/// A forward result paired with the HTTP status the caller should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub status: u16,
    pub result: ForwardResult,
}

fn default_method() -> String {
    "GET".to_string()
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.unwrap_or_default())
}

fn deserialize_nullable_method<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.unwrap_or_else(default_method))
}

fn deserialize_nullable_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let b: Option<bool> = Option::deserialize(deserializer)?;
    Ok(b.unwrap_or_default())
}

/// Accepts header text, `null`, or any other JSON value (stored as its JSON text).
fn deserialize_headers_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
