//! API trait definitions split by responsibility
//!
//! - [`AuthApi`] - Session operations (login, logout)
//! - [`ResourceApi`] - CRUD over the admin collections
//!
//! The [`AdminApi`](super::AdminApi) super-trait combines both.

mod auth;
mod resource;

pub use auth::AuthApi;
pub use resource::ResourceApi;
