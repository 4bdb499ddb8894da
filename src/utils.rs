//! Text clean-up helpers and file system checks.
//!
//! This module provides the small string policies applied to extracted
//! fields, plus output directory validation:
//! - Whitespace normalization and headline truncation for titles
//! - Character-capped truncation with an ellipsis for descriptions
//! - Log-friendly truncation of long values
//! - Write probing for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Marker appended to capped descriptions.
pub const ELLIPSIS: &str = "...";

/// Collapse every whitespace run (spaces, tabs, newlines) into a single space
/// and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_whitespace("  Dhaka\n\tflooded  "), "Dhaka flooded");
/// ```
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut a headline at its first comma or period.
///
/// Headlines on listing pages often run into a standfirst; keeping only the
/// text before the first terminator yields the bare headline. Titles that
/// legitimately contain a comma get clipped too.
pub fn cut_at_terminator(title: &str) -> String {
    match title.find([',', '.']) {
        Some(idx) => title[..idx].trim().to_string(),
        None => title.trim().to_string(),
    }
}

/// Cap `s` at `max` characters, appending [`ELLIPSIS`] when anything was cut.
///
/// Counts characters rather than bytes so multi-byte scripts are never split
/// mid-codepoint.
pub fn cap_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}{}", &s[..idx], ELLIPSIS),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
        None => s.to_string(),
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
