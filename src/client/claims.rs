//! Best-effort JWT claim decoding for role display
//!
//! Advisory only: nothing here verifies signatures, and every parse failure
//! yields empty claims instead of an error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::AccessToken;

/// Claims of interest to the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    roles: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
    #[serde(default)]
    authorities: Option<Value>,
}

/// Decode base64url (URL-safe base64, padding optional)
fn base64_decode_url(input: &str) -> Option<Vec<u8>> {
    use base64::{Engine as _, engine::general_purpose};

    general_purpose::URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .ok()
}

fn role_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::String(role)) => vec![role],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(role) => Some(role),
                Value::Object(map) => map
                    .get("authority")
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode the payload segment of `token`
pub fn decode_claims(token: &AccessToken) -> TokenClaims {
    let Some(payload) = token.as_str().split('.').nth(1) else {
        return TokenClaims::default();
    };
    let Some(bytes) = base64_decode_url(payload) else {
        return TokenClaims::default();
    };
    let Ok(raw) = serde_json::from_slice::<RawClaims>(&bytes) else {
        return TokenClaims::default();
    };

    let mut roles = role_list(raw.roles);
    if roles.is_empty() {
        roles = role_list(raw.role);
    }
    if roles.is_empty() {
        roles = role_list(raw.authorities);
    }

    let subject = match raw.sub {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => raw.email,
    };

    TokenClaims {
        subject,
        roles,
        expires_at: raw.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
    }
}

/// Case-insensitive role check, `false` on any decode problem
pub fn has_role(token: &AccessToken, role: &str) -> bool {
    decode_claims(token)
        .roles
        .iter()
        .any(|r| r.eq_ignore_ascii_case(role))
}
