// Library exports for the Agora client SDK
// This allows integration tests and the debug console to use the modules

pub mod activation;
pub mod api;
pub mod config;
pub mod error;
pub mod notifications;
pub mod report;
pub mod session;
pub mod submit;
pub mod types;

pub use error::{ApiError, Error, Result};
