//! Resource API trait for admin collections

use async_trait::async_trait;
use serde_json::Value;

use crate::client::models::Resource;
use crate::client::pagination::PaginationParams;
use crate::error::Result;

/// CRUD operations over the admin collections.
///
/// Payloads are returned with the response envelope already removed.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// List one page of a collection
    async fn list(&self, resource: Resource, pagination: Option<&PaginationParams>)
    -> Result<Value>;

    /// Fetch a single item
    async fn fetch(&self, resource: Resource, id: &str) -> Result<Value>;

    /// Create an item from a JSON body
    async fn create(&self, resource: Resource, body: Value) -> Result<Value>;

    /// Replace an item with a JSON body
    async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value>;

    /// Delete an item
    async fn remove(&self, resource: Resource, id: &str) -> Result<Value>;
}
