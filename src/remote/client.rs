//! HTTP client for the remote generation service

use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::{JobId, JobStatus};
use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    Body(String),
}

impl FetchError {
    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Serialize)]
struct StatusRequest<'a> {
    #[serde(rename = "jobIds")]
    job_ids: [&'a JobId; 1],
}

/// Client for the day-listing, job-status and image endpoints.
///
/// Requests carry the configured user agent and, when present, the session
/// cookie. Only the job-status call is bounded by a per-request timeout; the
/// builder-level connect timeout applies everywhere.
pub struct ServiceClient {
    client: Client,
    base_url: String,
    status_timeout: Duration,
    cookie: Option<String>,
}

impl ServiceClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            status_timeout: config.status_timeout.as_duration(),
            cookie: config.cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the ordered job ids enqueued on one calendar day.
    pub async fn day_listing(&self, date: NaiveDate) -> Result<Vec<JobId>> {
        let url = format!("{}/archive/day/", self.base_url);
        debug!(url, %date, "Fetching day listing");

        let request = self.client.get(&url).query(&[
            ("day", date.day()),
            ("month", date.month()),
            ("year", date.year() as u32),
        ]);

        let response = self
            .with_cookie(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Body(e.to_string()))
    }

    /// Fetch the status record for one job.
    pub async fn job_status(&self, id: &JobId) -> Result<JobStatus> {
        let url = format!("{}/job-status/", self.base_url);
        debug!(url, job_id = %id, "Fetching job status");

        let payload = serde_json::to_vec(&StatusRequest { job_ids: [id] })
            .map_err(|e| FetchError::Body(e.to_string()))?;

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .timeout(self.status_timeout);

        let response = self
            .with_cookie(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Body(e.to_string()))
    }

    /// Download one image as raw bytes.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        debug!(url, "Fetching image");

        let response = self
            .with_cookie(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        debug!(url, size = bytes.len(), "Image fetched");

        Ok(bytes)
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::RequestFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "https://service.example.com/api/app/".to_string(),
            ..ApiConfig::default()
        };

        let client = ServiceClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://service.example.com/api/app");
    }

    #[test]
    fn test_status_request_shape() {
        let id = JobId::from("job-1");
        let body = serde_json::to_string(&StatusRequest { job_ids: [&id] }).unwrap();
        assert_eq!(body, r#"{"jobIds":["job-1"]}"#);
    }

    #[test]
    fn test_status_code_accessor() {
        assert_eq!(FetchError::Status(403).status_code(), Some(403));
        assert_eq!(FetchError::Timeout.status_code(), None);
    }
}
