//! Access tokens and refresh-response token extraction
//!
//! The backend wraps the refreshed token in several different envelopes, so
//! extraction walks a fixed list of candidate locations and takes the first
//! plausible string.

use std::fmt;

use serde_json::Value;

/// Candidates this short are rejected as tokens
const MIN_TOKEN_LEN: usize = 10;

/// Opaque bearer credential
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// `None` for an empty string
    pub fn non_empty(token: String) -> Option<Self> {
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.0.chars().take(4).collect();
        write!(f, "AccessToken({}…)", shown)
    }
}

type Extractor = fn(&Value) -> Option<&str>;

/// Tried in order; first hit wins.
const EXTRACTORS: &[Extractor] = &[
    |v| v.get("token")?.as_str(),
    |v| v.get("accessToken")?.as_str(),
    |v| v.get("data")?.get("token")?.as_str(),
    |v| v.get("data")?.get("accessToken")?.as_str(),
    |v| v.pointer("/responseBody/data/token")?.as_str(),
    |v| v.pointer("/responseBody/data/accessToken")?.as_str(),
    |v| v.as_str(),
];

/// Pull a new access token out of a refresh response body
pub fn extract_access_token(body: &Value) -> Option<AccessToken> {
    EXTRACTORS
        .iter()
        .filter_map(|extract| extract(body))
        .find(|candidate| candidate.len() > MIN_TOKEN_LEN)
        .map(AccessToken::new)
}
