//! Business logic services.

pub mod analysis;
pub mod markdown;
pub mod prompt;
pub mod staging;

pub use analysis::AnalysisService;
pub use staging::{StagedVideo, VideoStager};
