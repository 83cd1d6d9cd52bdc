//! Backend module - render service trait, HTTP client and health monitoring

pub mod health;
pub mod http_backend;
pub mod traits;
