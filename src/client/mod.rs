//! Admin API client
//!
//! [`AdminClient`] is the single HTTP entry point. Every request goes through
//! the same interceptor pipeline: bearer token attached on the way out, then
//! 401 (refresh and replay), 409 (notify) and 429 (throttle) handled on the way
//! back.

pub mod admin;
pub mod api;
pub mod claims;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod refresh;
pub mod token;

pub use admin::{AdminClient, RequestSpec};
pub use api::{AuthApi, ResourceApi};
pub use claims::{TokenClaims, decode_claims, has_role};
pub use pagination::PaginationParams;
pub use token::AccessToken;

/// Combined admin API surface
pub trait AdminApi: AuthApi + ResourceApi {}

impl<T: AuthApi + ResourceApi> AdminApi for T {}
