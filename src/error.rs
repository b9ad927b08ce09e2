use std::path::PathBuf;

use thiserror::Error;

use crate::models::ModelKind;

/// Raised while loading a classifier at startup. The affected model kind is
/// marked unavailable; other kinds keep loading.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file '{}' not found", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to load model '{}': {message}", .path.display())]
    Runtime { path: PathBuf, message: String },
    #[error("model '{}' produces {outputs} classes but {labels} labels are configured", .path.display())]
    LabelMismatch {
        path: PathBuf,
        outputs: usize,
        labels: usize,
    },
}

/// Raised when a submitted file cannot be decoded or resized.
#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("Error processing image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error processing image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Error processing image: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model {0} is not available")]
    Unavailable(ModelKind),
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("model returned an empty probability vector")]
    EmptyOutput,
    #[error("model returned {outputs} probabilities for {labels} labels")]
    LabelMismatch { outputs: usize, labels: usize },
    #[error("model returned no comparable probability")]
    NotANumber,
}

/// Everything that can abort a single classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Image(#[from] ImageProcessingError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
