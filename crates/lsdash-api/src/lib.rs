// lsdash-api: Async Rust client for the LearningStudio REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod courses;
mod feed;
mod me;

pub use auth::{AccessToken, AppCredentials, TokenManager, UserCredentials};
pub use client::ApiClient;
pub use error::Error;
pub use transport::TransportConfig;
