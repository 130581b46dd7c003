//! Session API trait

use async_trait::async_trait;

use crate::client::AccessToken;
use crate::error::Result;

/// Session operations for the admin API
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for an access token and store it
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken>;

    /// Tell the backend the session is over (best effort) and drop local state
    async fn logout(&self) -> Result<()>;
}
