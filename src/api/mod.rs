//! Transport layer: credentialed JSON over HTTP.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions, REQUEST_TIMEOUT};
pub use error::ApiError;
