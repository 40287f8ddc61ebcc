//! Job inclusion rules
//!
//! Generation jobs fall into grids (2x2 result sheets) and upscales, and
//! carry a model version in their parsed prompt parameters. Which of them a
//! run archives is decided here, from the status record alone.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::remote::JobStatus;

/// Which side of the catalogue a run archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    /// Keep version 5+ grid sheets
    AllImagesV5Grids,
    /// Keep version 5+ upscales
    OnlyV5Upscales,
}

/// Version marker for a job. `niji` wins over `version` when it parses;
/// values arrive as JSON strings or numbers depending on the prompt.
pub fn version_number(job: &JobStatus) -> Option<f64> {
    let params = job.parsed_params.as_ref()?;
    param_number(params.niji.as_ref()).or_else(|| param_number(params.version.as_ref()))
}

fn param_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decide whether a job's images belong in the archive under `mode`.
///
/// Pre-v5 upscales are always in and pre-v5 grids never are; for version 5+
/// the mode selects exactly one of grids or upscales. A job without a
/// readable version counts as pre-v5, and a missing `type` counts as an
/// upscale.
pub fn should_include(job: &JobStatus, mode: FilterMode) -> bool {
    let is_v5_plus = version_number(job).is_some_and(|v| v >= 5.0);
    let is_upscale = job.kind.as_deref() != Some("grid");

    match (is_v5_plus, is_upscale, mode) {
        (true, false, FilterMode::AllImagesV5Grids) => true,
        (true, true, FilterMode::OnlyV5Upscales) => true,
        (false, true, _) => true,
        _ => false,
    }
}
