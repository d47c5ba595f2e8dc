//! Shared data models for the patient video intake service.
//!
//! This crate provides Serde-serializable types for:
//! - Supported video container formats
//! - Analysis responses returned to the intake page

pub mod analysis;
pub mod video;

// Re-export common types
pub use analysis::{AnalysisResponse, StagedFileSummary};
pub use video::{UnsupportedFormat, VideoFormat};
