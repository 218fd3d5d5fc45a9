//! Wire types for the action-execution gateway and lenient payload extraction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::GatewayError;

/// Body of `POST /actions/{action}/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub input: Value,
}

/// Content and address of the page the browser is currently on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub content: String,
    pub url: String,
}

impl PageSnapshot {
    /// Reads `content` (falling back to `pageSnapshot`) and `url` from an
    /// unwrapped payload. Missing keys become empty strings.
    pub fn from_payload(data: &Value) -> Self {
        let content = str_field(data, "content")
            .or_else(|| str_field(data, "pageSnapshot"))
            .unwrap_or_default();
        let url = str_field(data, "url").unwrap_or_default();
        Self { content, url }
    }
}

/// Screenshot URL from an unwrapped payload (`url`, else `screenshotUrl`).
pub fn screenshot_url(data: &Value) -> String {
    str_field(data, "url")
        .or_else(|| str_field(data, "screenshotUrl"))
        .unwrap_or_default()
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Strip the gateway's `data` envelope, which is sometimes nested twice.
///
/// Non-object payloads are returned as `{"raw": payload}` so callers can
/// always index by key.
pub fn unwrap_payload(body: Value) -> Value {
    let mut data = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };

    if let Value::Object(ref mut map) = data
        && map.contains_key("data")
    {
        data = map.remove("data").unwrap_or(Value::Null);
    }

    match data {
        Value::Object(_) => data,
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("raw".to_string(), other);
            Value::Object(wrapped)
        }
    }
}

/// The `error` field of a response body, if it is set to something truthy.
pub fn error_field(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map an error message reported inside a 2xx body to a [`GatewayError`].
pub fn classify_error(action: &str, message: String) -> GatewayError {
    let lower = message.to_lowercase();
    if ["auth", "unauthorized", "forbidden", "401", "403"]
        .iter()
        .any(|t| lower.contains(t))
    {
        return GatewayError::Authentication {
            action: action.to_string(),
            message,
        };
    }
    if ["rate limit", "too many requests", "429"]
        .iter()
        .any(|t| lower.contains(t))
    {
        return GatewayError::RateLimited {
            action: action.to_string(),
            retry_after_ms: None,
        };
    }
    GatewayError::Platform {
        action: action.to_string(),
        message,
    }
}

const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "key", "credential", "auth"];

/// Copy of `params` with values under sensitive-looking keys masked, recursively.
pub fn redact_params(params: &Value) -> Value {
    match params {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let lower = k.to_lowercase();
                    if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                        (k.clone(), Value::String("***REDACTED***".into()))
                    } else {
                        (k.clone(), redact_params(v))
                    }
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
