//! Video container formats accepted by the intake page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a file is not one of the accepted containers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported video format: {0}")]
pub struct UnsupportedFormat(pub String);

/// Accepted video container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Mov,
    Avi,
}

impl VideoFormat {
    /// All accepted formats, in the order the file picker lists them.
    pub const ALL: [VideoFormat; 3] = [VideoFormat::Mp4, VideoFormat::Mov, VideoFormat::Avi];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mov => "mov",
            VideoFormat::Avi => "avi",
        }
    }

    /// MIME type reported to the inference provider.
    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Mov => "video/quicktime",
            VideoFormat::Avi => "video/x-msvideo",
        }
    }

    /// Detect the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }

    /// Detect the format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "video/mp4" => Some(VideoFormat::Mp4),
            "video/quicktime" => Some(VideoFormat::Mov),
            "video/x-msvideo" | "video/avi" | "video/msvideo" => Some(VideoFormat::Avi),
            _ => None,
        }
    }

    /// Detect the format of an uploaded part.
    ///
    /// The file name wins; the declared content type is only consulted when
    /// the name carries no recognised extension.
    pub fn detect(
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<Self, UnsupportedFormat> {
        file_name
            .and_then(Self::from_file_name)
            .or_else(|| content_type.and_then(Self::from_mime_type))
            .ok_or_else(|| {
                UnsupportedFormat(
                    file_name
                        .or(content_type)
                        .unwrap_or("unnamed")
                        .to_string(),
                )
            })
    }

    /// Value for an HTML `accept` attribute covering every format.
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for VideoFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" => Ok(VideoFormat::Mp4),
            "mov" => Ok(VideoFormat::Mov),
            "avi" => Ok(VideoFormat::Avi),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }
}
