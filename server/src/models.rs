use crate::error::ApiError;
use restdesk_core::{ForwardRequest, RequestDefinition};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Body of `POST /request`.
#[derive(Debug, Deserialize)]
pub struct ForwardPayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_header_fields")]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub proxy: Option<bool>,
}

impl ForwardPayload {
    pub fn into_request(self) -> Result<ForwardRequest, ApiError> {
        let url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing 'url' in request".to_string()))?;

        Ok(ForwardRequest {
            url,
            method: self.method.unwrap_or_default(),
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            proxy: self.proxy.unwrap_or(false),
        })
    }
}

/// Body of `POST /saved`: a name plus the definition fields.
#[derive(Debug, Deserialize)]
pub struct SavePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub definition: RequestDefinition,
}

impl SavePayload {
    pub fn into_parts(self) -> Result<(String, RequestDefinition), ApiError> {
        match self.name {
            Some(name) if !name.is_empty() => Ok((name, self.definition)),
            _ => Err(ApiError::BadRequest(
                "Missing 'name' for saved request".to_string(),
            )),
        }
    }
}

/// Headers arrive either as an object or as the JSON text of one.
fn deserialize_header_fields<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(fields)) => Ok(fields),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(text)) => serde_json::from_str(&text).map_err(|e| {
            serde::de::Error::custom(format!("headers text is not a JSON object: {e}"))
        }),
        Some(_) => Err(serde::de::Error::custom("headers must be a JSON object")),
    }
}
