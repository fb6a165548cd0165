//! Model artifact persistence and inference

pub mod artifact;
pub mod inference;
pub mod loader;

pub use artifact::{ModelArtifact, TrainingSummary, ARTIFACT_FORMAT_VERSION};
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
