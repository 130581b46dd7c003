//! Admin API data models

mod envelope;
mod resource;

pub use envelope::{conflict_message, unwrap_data};
pub use resource::Resource;

use serde::Serialize;

/// Credentials posted to the login endpoint
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
