use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::nutrition::{extract_detections, Extraction};
use crate::state::AppState;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// An uploaded image written to the upload directory for one scan.
/// Dropping it removes the file, whichever way the request ends.
pub struct StagedUpload {
    file: NamedTempFile,
    content_type: String,
}

impl StagedUpload {
    pub async fn create(dir: &Path, item: UploadItem) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create upload dir {}", dir.display()))?;

        let suffix = format!(".{}", ext_from_mime(&item.content_type).unwrap_or("bin"));
        let dir: PathBuf = dir.to_path_buf();
        let body = item.body;
        let file = tokio::task::spawn_blocking(move || -> anyhow::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("scan-")
                .suffix(&suffix)
                .tempfile_in(&dir)
                .context("create staged upload")?;
            file.write_all(&body).context("write staged upload")?;
            file.flush()?;
            Ok(file)
        })
        .await
        .context("staging task panicked")??;

        Ok(Self {
            file,
            content_type: item.content_type,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub async fn read(&self) -> anyhow::Result<Vec<u8>> {
        tokio::fs::read(self.path())
            .await
            .with_context(|| format!("read staged upload {}", self.path().display()))
    }
}

/// Stages the upload, sends it to the vision model and extracts detections
/// from the reply. The staged file is gone when this returns.
pub async fn scan_image(st: &AppState, item: UploadItem) -> Result<Extraction, AppError> {
    let scan_id = Uuid::new_v4();
    let staged = StagedUpload::create(&st.config.upload_dir, item).await?;
    debug!(%scan_id, path = %staged.path().display(), "upload staged");

    let image = staged.read().await?;
    let reply = st.vision.describe_image(&image, staged.content_type()).await?;

    let extraction = extract_detections(&reply);
    match &extraction {
        Extraction::Detections(items) => info!(%scan_id, detections = items.len(), "image scanned"),
        Extraction::RawText(_) => info!(%scan_id, "vision reply held no structured detections"),
    }
    Ok(extraction)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
