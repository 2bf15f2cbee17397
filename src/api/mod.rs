pub mod client;
mod endpoints;
pub mod error;

pub use client::{ApiClient, RetryPolicy};
pub use error::ApiError;
