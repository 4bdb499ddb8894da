//! JSON snapshot files.
//!
//! Besides printing the envelope, a run can keep a copy on disk:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── all.json
//!     ├── thedailystar.json
//!     └── sources.json
//! ```
//! A later run on the same day overwrites the file of the same name.

use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `envelope` to `{json_output_dir}/{today}/{name}.json`.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip(envelope), fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot<T: Serialize>(
    envelope: &T,
    json_output_dir: &str,
    name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(envelope)?;
    let date = Local::now().date_naive().to_string();
    let dir = PathBuf::from(json_output_dir).join(date);

    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dir.join(format!("{name}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsResponse;

    #[tokio::test]
    async fn test_write_snapshot_layout() {
        let base = std::env::temp_dir().join(format!("top_news_json_{}", std::process::id()));
        let base_str = base.to_string_lossy().to_string();

        let resp = NewsResponse::new(vec![], Some("cnn".to_string()));
        let path = write_snapshot(&resp, &base_str, "cnn").await.unwrap();

        assert!(path.ends_with("cnn.json"));
        assert_eq!(
            path.parent().unwrap().file_name().unwrap().to_string_lossy(),
            Local::now().date_naive().to_string()
        );
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["source"], "cnn");
        assert_eq!(written["count"], 0);

        let _ = std::fs::remove_dir_all(&base);
    }
}
