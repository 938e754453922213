//! Durable persistence of the rendered dataset.
//!
//! A [`Destination`] abstracts over the two supported sinks:
//!
//! - **Local**: a filesystem path; parent directories are created as
//!   needed and the written path is the destination identifier.
//! - **S3**: a bucket plus key prefix; objects are partitioned by UTC
//!   date and named with a UTC timestamp:
//!
//!   ```text
//!   <prefix>/<YYYY>/<MM>/<DD>/articles_<YYYYMMDDTHHMMSSZ>.csv
//!   ```
//!
//!   The returned identifier is the full `s3://bucket/key` URL.
//!
//! Local writes carry no `scraped_at` column; object-store writes do.

use crate::models::Article;
use crate::outputs::csv;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Where a run's dataset lands.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Write the CSV to this filesystem path.
    Local { path: PathBuf },
    /// Upload the CSV under this bucket and key prefix.
    S3 { bucket: String, key_prefix: String },
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Local { path } => write!(f, "{}", path.display()),
            Destination::S3 { bucket, key_prefix } => {
                write!(f, "s3://{}/{}", bucket, key_prefix)
            }
        }
    }
}

/// Sink failures. Always fatal to the run: extraction success without a
/// persisted dataset still reports overall failure.
#[derive(Debug, Error)]
pub enum SinkError {
    /// CSV serialization failed.
    #[error("serializing articles failed: {0}")]
    Csv(#[from] ::csv::Error),
    /// Filesystem write failed (permissions, missing volume, quota).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// S3 upload failed (connectivity, credentials, bucket policy).
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Serialize `articles` and persist them to `destination`.
///
/// # Returns
///
/// The destination identifier: the filesystem path written, or the
/// `s3://bucket/key` URL of the uploaded object.
///
/// # Errors
///
/// [`SinkError`] on any serialization, filesystem, or upload failure.
#[instrument(level = "info", skip_all, fields(%destination, count = articles.len()))]
pub async fn write_run(articles: &[Article], destination: &Destination) -> Result<String, SinkError> {
    match destination {
        Destination::Local { path } => {
            let data = csv::render(articles, false)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, &data).await?;
            let written = path.display().to_string();
            info!(path = %written, bytes = data.len(), "Wrote article CSV");
            Ok(written)
        }
        Destination::S3 { bucket, key_prefix } => {
            let data = csv::render(articles, true)?;
            let bytes = data.len();
            let key = object_key(key_prefix, Utc::now());

            let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_s3::Client::new(&config);
            client
                .put_object()
                .bucket(bucket)
                .key(&key)
                .content_type("text/csv")
                .body(ByteStream::from(data))
                .send()
                .await
                .map_err(|e| SinkError::Upload(format!("s3://{bucket}/{key}: {e}")))?;

            let written = format!("s3://{bucket}/{key}");
            info!(url = %written, bytes, "Uploaded article CSV");
            Ok(written)
        }
    }
}

/// Build the date-partitioned object key for an upload at `now`.
fn object_key(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}/articles_{}.csv",
        prefix.trim_end_matches('/'),
        now.format("%Y/%m/%d"),
        now.format("%Y%m%dT%H%M%SZ")
    )
}

/// Probe that a local destination's directory is writable.
///
/// Run before any network work so permission problems fail the run early
/// instead of after minutes of polite crawling. No-op for S3 destinations;
/// their failures surface at upload time.
pub async fn ensure_writable(destination: &Destination) -> Result<(), SinkError> {
    let Destination::Local { path } = destination else {
        return Ok(());
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).await?;
    let probe = Path::new(&dir).join("..__probe_write__");
    fs::write(&probe, b"probe").await?;
    let _ = fs::remove_file(&probe).await;
    Ok(())
}
