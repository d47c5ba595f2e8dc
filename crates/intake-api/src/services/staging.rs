//! Staging of uploaded videos on local disk.
//!
//! Each upload is streamed into its own temp file (always `.mp4` suffixed)
//! and lives exactly as long as the request handling it. Dropping a
//! [`StagedVideo`] removes the file, so early returns and panics clean up too.

use std::io;
use std::path::{Path, PathBuf};

use intake_models::{StagedFileSummary, VideoFormat};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Suffix of every staged file, whatever the uploaded container.
pub const STAGED_SUFFIX: &str = ".mp4";

/// Writes uploads into a staging directory.
#[derive(Debug, Clone)]
pub struct VideoStager {
    dir: PathBuf,
}

impl VideoStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream `reader` into a new staged file.
    ///
    /// The file is removed again if the copy fails or nothing was written.
    pub async fn stage<R>(
        &self,
        original_name: &str,
        format: VideoFormat,
        mut reader: R,
    ) -> ApiResult<StagedVideo>
    where
        R: AsyncRead + Unpin,
    {
        let temp = tempfile::Builder::new()
            .prefix("intake-")
            .suffix(STAGED_SUFFIX)
            .tempfile_in(&self.dir)?;
        let (file, path) = temp.into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let size_bytes = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        drop(file);

        if size_bytes == 0 {
            return Err(ApiError::bad_request("Uploaded video is empty"));
        }

        debug!(path = %path.display(), size_bytes, %format, "Staged upload");
        Ok(StagedVideo {
            path,
            original_name: original_name.to_string(),
            format,
            size_bytes,
        })
    }
}

/// A video written to local disk for the duration of one request.
#[derive(Debug)]
pub struct StagedVideo {
    path: TempPath,
    original_name: String,
    format: VideoFormat,
    size_bytes: u64,
}

impl StagedVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn summary(&self) -> StagedFileSummary {
        StagedFileSummary {
            original_name: self.original_name.clone(),
            format: self.format,
            size_bytes: self.size_bytes,
        }
    }

    /// Delete the staged file. A file that is already gone is not an error.
    pub fn cleanup(self) -> io::Result<()> {
        match self.path.close() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
