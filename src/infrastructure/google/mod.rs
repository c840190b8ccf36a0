pub mod auth;

pub use auth::{AccessTokenProvider, ServiceAccountTokenProvider, StaticTokenProvider};
