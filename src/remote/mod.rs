//! Access to the remote generation service

mod client;
mod models;

pub use client::{FetchError, Result, ServiceClient};
pub use models::{JobId, JobStatus, ParsedParams};
