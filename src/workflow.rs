//! Desktop diagnosis flow as explicit states.
//!
//! `NoImage -> ImageLoaded -> Predicting -> ResultShown`, with a new image
//! selection returning to `ImageLoaded` from anywhere except `Predicting`.
//! Kept free of GUI types so the transitions can be tested headless.

use std::path::{Path, PathBuf};

use crate::error::ClassifyError;
use crate::models::{ModelKind, PredictionResult};

pub const IDLE_TEXT: &str = "Select a model, upload an image, and click 'Get Diagnosis'.";
pub const READY_TEXT: &str = "Click 'Get Diagnosis' to analyze.";
pub const ANALYZING_TEXT: &str = "Analyzing...";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Diagnosis(PredictionResult),
    ImageFailed(String),
    PredictionFailed(String),
}

impl From<Result<PredictionResult, ClassifyError>> for Outcome {
    fn from(result: Result<PredictionResult, ClassifyError>) -> Self {
        match result {
            Ok(prediction) => Outcome::Diagnosis(prediction),
            Err(ClassifyError::Image(e)) => Outcome::ImageFailed(e.to_string()),
            Err(ClassifyError::Prediction(e)) => Outcome::PredictionFailed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    NoImage,
    ImageLoaded { path: PathBuf },
    Predicting { path: PathBuf, kind: ModelKind },
    ResultShown { path: PathBuf, outcome: Outcome },
}

#[derive(Debug, Clone)]
pub struct Workflow {
    stage: Stage,
    available: Vec<ModelKind>,
    selected: Option<ModelKind>,
}

impl Workflow {
    pub fn new(available: Vec<ModelKind>) -> Self {
        let selected = available.first().copied();
        Self {
            stage: Stage::NoImage,
            available,
            selected,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn selected(&self) -> Option<ModelKind> {
        self.selected
    }

    pub fn image_path(&self) -> Option<&Path> {
        match &self.stage {
            Stage::NoImage => None,
            Stage::ImageLoaded { path }
            | Stage::Predicting { path, .. }
            | Stage::ResultShown { path, .. } => Some(path),
        }
    }

    /// Whether `path` is still the image on screen; async work started for
    /// an earlier pick must not land on a later one.
    pub fn is_current_image(&self, path: &Path) -> bool {
        self.image_path() == Some(path)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.stage, Stage::Predicting { .. })
    }

    /// Only loaded models can be picked; anything else is ignored.
    pub fn select_model(&mut self, kind: ModelKind) {
        if self.available.contains(&kind) {
            self.selected = Some(kind);
        }
    }

    pub fn image_selected(&mut self, path: PathBuf) {
        if !self.is_busy() {
            self.stage = Stage::ImageLoaded { path };
        }
    }

    /// A cancelled dialog or an unreadable preview drops the current image.
    pub fn image_cleared(&mut self) {
        if !self.is_busy() {
            self.stage = Stage::NoImage;
        }
    }

    pub fn can_predict(&self) -> bool {
        self.selected.is_some()
            && matches!(
                self.stage,
                Stage::ImageLoaded { .. } | Stage::ResultShown { .. }
            )
    }

    /// Moves to `Predicting` and hands back the job to run off the UI thread.
    pub fn start_prediction(&mut self) -> Option<(ModelKind, PathBuf)> {
        if !self.can_predict() {
            return None;
        }
        let kind = self.selected?;
        let path = self.image_path()?.to_path_buf();
        self.stage = Stage::Predicting {
            path: path.clone(),
            kind,
        };
        Some((kind, path))
    }

    pub fn finish_prediction(&mut self, outcome: Outcome) {
        if let Stage::Predicting { path, .. } = &self.stage {
            self.stage = Stage::ResultShown {
                path: path.clone(),
                outcome,
            };
        }
    }

    pub fn headline(&self) -> String {
        match &self.stage {
            Stage::NoImage => IDLE_TEXT.to_string(),
            Stage::ImageLoaded { .. } => READY_TEXT.to_string(),
            Stage::Predicting { .. } => ANALYZING_TEXT.to_string(),
            Stage::ResultShown { outcome, .. } => match outcome {
                Outcome::Diagnosis(result) => format!("Predicted Class: {}", result.class_name),
                Outcome::ImageFailed(_) => "Prediction failed due to image error.".to_string(),
                Outcome::PredictionFailed(_) => "Prediction failed.".to_string(),
            },
        }
    }

    pub fn detail(&self) -> Option<String> {
        match &self.stage {
            Stage::ResultShown { outcome, .. } => Some(match outcome {
                Outcome::Diagnosis(result) => {
                    format!("Confidence: {:.2}%", result.confidence_percent())
                }
                Outcome::ImageFailed(msg) | Outcome::PredictionFailed(msg) => msg.clone(),
            }),
            _ => None,
        }
    }
}
