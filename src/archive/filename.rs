//! Filename helpers for archive entries

use chrono::{DateTime, NaiveDateTime};

/// Longest sanitized prompt fragment carried in an image filename.
pub const MAX_PROMPT_LEN: usize = 48;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Make free text safe for a filename.
///
/// Spaces become underscores, anything outside `[A-Za-z0-9_-]` is dropped and
/// the rest is truncated to `max_len`. Missing text becomes the literal
/// `"None"`.
pub fn sanitize(input: Option<&str>, max_len: Option<usize>) -> String {
    let Some(input) = input else {
        return "None".to_string();
    };

    let mut out: String = input
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if let Some(max_len) = max_len {
        // Sanitized output is ASCII, so byte truncation lands on a boundary
        out.truncate(max_len);
    }

    out
}

/// Render a service timestamp in the sortable `YYYY-MM-DD-HHMMSS` form used
/// by archive entry names.
///
/// Unparseable input degrades to its sanitized raw form so a filename can
/// always be produced.
pub fn format_enqueue_time(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "None".to_string();
    };

    match parse_datetime(raw) {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => sanitize(Some(raw), None),
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();

    // Offsets are ignored; entry names carry the clock time as written
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    let bare = trimmed.trim_end_matches('Z');
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(bare, fmt).ok())
}

/// Build the archive entry name for one image of a job.
///
/// The index segment appears only when the job produced more than one image.
pub fn image_filename(
    timestamp: &str,
    job_id: &str,
    index: Option<usize>,
    prompt: Option<&str>,
) -> String {
    let prompt = sanitize(prompt, Some(MAX_PROMPT_LEN));

    match index {
        Some(index) => format!("{}_{}_{}_{}.png", timestamp, job_id, index, prompt),
        None => format!("{}_{}_{}.png", timestamp, job_id, prompt),
    }
}
