use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Accepted answer-file extensions, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Default upload cap. An earlier portal revision used 2 MB; the current one
/// allows 10 MB, overridable via `MAX_UPLOAD_MB`.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Default grading-poll interval, overridable via `POLL_INTERVAL_MS`.
/// Portal revisions have shipped 2000 ms and 3000 ms; 3000 ms is the
/// recommended value.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Portal origin, e.g. `http://localhost:8000`. API paths are appended
    /// under `/api`, stored files under `/storage`.
    pub base_url: String,
    pub poll_interval: Duration,
    pub max_upload_bytes: u64,
    pub session_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let base_url = env::var("PORTAL_URL")
            .context("PORTAL_URL not found. Please set it in .env file or environment")?;

        if base_url.is_empty() {
            anyhow::bail!("PORTAL_URL is empty");
        }

        let poll_interval_ms = match env::var("POLL_INTERVAL_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("POLL_INTERVAL_MS must be a number of milliseconds")?,
            Err(_) => DEFAULT_POLL_INTERVAL_MS,
        };

        let max_upload_bytes = match env::var("MAX_UPLOAD_MB") {
            Ok(raw) => {
                let mb = raw
                    .parse::<u64>()
                    .context("MAX_UPLOAD_MB must be a number of megabytes")?;
                mb * 1024 * 1024
            }
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let session_file = env::var("PORTAL_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".materi-session.json"));

        Ok(Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_upload_bytes,
            session_file,
        })
    }
}
