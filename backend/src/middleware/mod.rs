//! Request middleware and extractors

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser, Staff};
