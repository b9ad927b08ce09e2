pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod models;
pub mod preprocess;
pub mod registry;
pub mod state;
pub mod workflow;

pub use classifier::{Classifier, OnnxClassifier, TensorLayout};
pub use error::{ClassifyError, ImageProcessingError, ModelLoadError, PredictionError};
pub use inference::{classify, decode};
pub use models::{ModelKind, PredictionResult};
pub use preprocess::{preprocess_image, ImageTensor};
pub use registry::{ModelEntry, ModelRegistry, ModelsConfig};
pub use state::AppState;

#[cfg(feature = "gui")]
pub mod gui;
