//! Backend response envelope
//!
//! Admin endpoints answer `{statuscode, responseBody: {data, message, errors}}`,
//! though some return the payload bare.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback text when a 409 carries no readable message
pub const DEFAULT_CONFLICT_MESSAGE: &str = "Conflict error";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub statuscode: Option<u16>,

    #[serde(rename = "responseBody", default)]
    pub response_body: Option<ResponseBody>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

/// Business payload of a response, looking through whichever envelope is present
pub fn unwrap_data(body: Value) -> Value {
    if let Ok(Envelope {
        response_body: Some(inner),
        ..
    }) = serde_json::from_value::<Envelope>(body.clone())
    {
        return inner.data;
    }

    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn message_at<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
}

/// Human-readable message for a 409 response
pub fn conflict_message(body: &Value) -> String {
    [
        "/message",
        "/errors/messages/0",
        "/responseBody/message",
        "/responseBody/errors/messages/0",
    ]
    .iter()
    .find_map(|pointer| message_at(body, pointer))
    .unwrap_or(DEFAULT_CONFLICT_MESSAGE)
    .to_string()
}
