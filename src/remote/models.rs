//! Wire models for the remote generation service.
//!
//! Two endpoints matter to the archiver:
//! - The day listing returns the ids of every job enqueued on a calendar day
//! - `POST /job-status/` returns one [`JobStatus`] record for a requested id
//!
//! # Job status payload
//!
//! A trimmed response example (as JSON):
//!
//! ```json
//! {
//!   "id": "8f3c9e52-1dba-44a7-92b5-0c6e1f0a7d11",
//!   "enqueue_time": "2023-06-01 12:30:45.123456",
//!   "prompt": "a lighthouse at dusk",
//!   "username": "someone",
//!   "type": "grid",
//!   "_parsed_params": { "version": "5.2" },
//!   "image_paths": [
//!     "https://cdn.example.com/8f3c9e52/0_0.png",
//!     "https://cdn.example.com/8f3c9e52/0_1.png"
//!   ]
//! }
//! ```
//!
//! Fields the archiver does not interpret are carried through a flattened
//! map, so manifest entries keep the full upstream record. The archiver
//! itself appends `_archived_files`: the zip entry names written for the job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque job identifier.
///
/// Day listings have been observed carrying both strings and bare numbers;
/// either form is preserved as received so status requests echo it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Text(String),
    Number(i64),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Text(s) => f.write_str(s),
            JobId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId::Text(value.to_string())
    }
}

/// Prompt parameters as parsed by the service.
///
/// Only the version markers are interpreted here; their values can be JSON
/// strings or numbers depending on the prompt, so they stay as raw [`Value`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niji: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One job's status record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    #[serde(default)]
    pub enqueue_time: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// `"grid"` for a 2x2 result sheet; anything else counts as an upscale.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "_parsed_params", default)]
    pub parsed_params: Option<ParsedParams>,
    /// `null` when the job produced no downloadable images.
    #[serde(default)]
    pub image_paths: Option<Vec<String>>,
    /// Appended by the archiver; never sent by the service.
    #[serde(rename = "_archived_files", default)]
    pub archived_files: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobStatus {
    pub fn image_count(&self) -> usize {
        self.image_paths.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_untagged_forms() {
        let ids: Vec<JobId> = serde_json::from_str(r#"["abc-123", 77]"#).unwrap();
        assert_eq!(ids[0], JobId::from("abc-123"));
        assert_eq!(ids[1], JobId::Number(77));

        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["abc-123",77]"#);
    }

    #[test]
    fn test_job_status_renames() {
        let json = r#"{
            "id": "job-1",
            "enqueue_time": "2023-06-01 12:30:45.123456",
            "prompt": "a lighthouse at dusk",
            "type": "grid",
            "_parsed_params": { "version": "5.2" },
            "image_paths": ["https://cdn.example.com/a.png"]
        }"#;

        let job: JobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(job.kind.as_deref(), Some("grid"));
        assert_eq!(job.image_count(), 1);
        assert!(job.archived_files.is_empty());

        let params = job.parsed_params.as_ref().unwrap();
        assert_eq!(params.version, Some(Value::String("5.2".to_string())));
        assert_eq!(params.niji, None);
    }

    #[test]
    fn test_job_status_null_image_paths() {
        let json = r#"{"id": "job-2", "image_paths": null}"#;
        let job: JobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(job.image_paths, None);
        assert_eq!(job.image_count(), 0);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"id": "job-3", "event": {"height": 1024}, "user_id": "u-9"}"#;
        let job: JobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(job.extra["user_id"], Value::String("u-9".to_string()));

        let out: Value = serde_json::to_value(&job).unwrap();
        assert_eq!(out["event"]["height"], Value::from(1024));
        // The archiver's own field is always present in serialized records
        assert_eq!(out["_archived_files"], Value::Array(vec![]));
    }

    #[test]
    fn test_archived_files_serialize() {
        let json = r#"{"id": "job-4"}"#;
        let mut job: JobStatus = serde_json::from_str(json).unwrap();
        job.archived_files.push("2023-06-01-123045_job-4_x.png".to_string());

        let out = serde_json::to_string(&job).unwrap();
        assert!(out.contains(r#""_archived_files":["2023-06-01-123045_job-4_x.png"]"#));
    }
}
