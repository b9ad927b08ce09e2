use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::{Classifier, OnnxClassifier, TensorLayout};
use crate::error::{ModelLoadError, PredictionError};
use crate::models::{ModelKind, ModelStatus};

/// A loaded classifier together with the labels of its output vector.
#[derive(Clone)]
pub struct ModelEntry {
    kind: ModelKind,
    classifier: Arc<dyn Classifier>,
    class_labels: Vec<String>,
}

impl ModelEntry {
    pub fn new(kind: ModelKind, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            kind,
            classifier,
            class_labels: kind.class_labels().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }
}

impl std::fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEntry")
            .field("kind", &self.kind)
            .field("class_labels", &self.class_labels)
            .finish_non_exhaustive()
    }
}

/// Why a configured model kind is unavailable.
#[derive(Debug)]
pub struct LoadFailure {
    pub kind: ModelKind,
    pub path: PathBuf,
    pub error: ModelLoadError,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error loading model '{}' ({}): {}",
            self.path.display(),
            self.kind,
            self.error
        )
    }
}

#[derive(Debug)]
enum ModelSlot {
    Loaded(ModelEntry),
    Unavailable(LoadFailure),
}

/// Where to find each model on disk and how to feed it.
#[derive(Debug, Clone)]
pub struct ModelsConfig {
    pub paths: Vec<(ModelKind, PathBuf)>,
    pub layout: TensorLayout,
}

/// Every configured model kind, loaded once at startup and read-only after.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    slots: HashMap<ModelKind, ModelSlot>,
}

impl ModelRegistry {
    /// Loads every configured model. A failure only marks that kind
    /// unavailable; loading continues with the rest.
    pub fn load(config: &ModelsConfig) -> Self {
        let mut registry = Self::default();
        for (kind, path) in &config.paths {
            let kind = *kind;
            match OnnxClassifier::load(path, config.layout, kind.class_labels().len()) {
                Ok(classifier) => {
                    log::info!(
                        "Model '{}' ({kind}) loaded successfully.",
                        classifier.path().display()
                    );
                    registry.insert(ModelEntry::new(kind, Arc::new(classifier)));
                }
                Err(error) => {
                    let failure = LoadFailure {
                        kind,
                        path: path.clone(),
                        error,
                    };
                    log::error!("{failure}");
                    registry.mark_unavailable(failure);
                }
            }
        }
        registry
    }

    pub fn insert(&mut self, entry: ModelEntry) {
        self.slots.insert(entry.kind(), ModelSlot::Loaded(entry));
    }

    pub fn mark_unavailable(&mut self, failure: LoadFailure) {
        self.slots.insert(failure.kind, ModelSlot::Unavailable(failure));
    }

    pub fn with_entry(mut self, entry: ModelEntry) -> Self {
        self.insert(entry);
        self
    }

    pub fn lookup(&self, kind: ModelKind) -> Result<&ModelEntry, PredictionError> {
        match self.slots.get(&kind) {
            Some(ModelSlot::Loaded(entry)) => Ok(entry),
            _ => Err(PredictionError::Unavailable(kind)),
        }
    }

    pub fn load_failure(&self, kind: ModelKind) -> Option<&LoadFailure> {
        match self.slots.get(&kind) {
            Some(ModelSlot::Unavailable(failure)) => Some(failure),
            _ => None,
        }
    }

    /// Failed kinds, in declaration order.
    pub fn load_failures(&self) -> Vec<&LoadFailure> {
        ModelKind::ALL
            .into_iter()
            .filter_map(|kind| self.load_failure(kind))
            .collect()
    }

    /// Loaded kinds, in declaration order.
    pub fn available_kinds(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|kind| matches!(self.slots.get(kind), Some(ModelSlot::Loaded(_))))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.available_kinds().is_empty()
    }

    pub fn statuses(&self) -> Vec<ModelStatus> {
        ModelKind::ALL
            .into_iter()
            .map(|kind| {
                let (available, error) = match self.slots.get(&kind) {
                    Some(ModelSlot::Loaded(_)) => (true, None),
                    Some(ModelSlot::Unavailable(failure)) => {
                        (false, Some(failure.error.to_string()))
                    }
                    None => (false, Some("not configured".to_string())),
                };
                ModelStatus {
                    model_type: kind.id().to_string(),
                    display_name: kind.display_name().to_string(),
                    available,
                    error,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::ImageTensor;

    struct Fixed;

    impl Classifier for Fixed {
        fn predict(&self, _input: &ImageTensor) -> Result<Vec<f32>, PredictionError> {
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    #[test]
    fn one_missing_model_does_not_block_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelsConfig {
            paths: vec![
                (ModelKind::Covid, dir.path().join("missing.onnx")),
                (ModelKind::BrainTumor, dir.path().join("also-missing.onnx")),
            ],
            layout: TensorLayout::Nhwc,
        };
        let registry = ModelRegistry::load(&config).with_entry(ModelEntry::new(
            ModelKind::Covid,
            Arc::new(Fixed),
        ));

        assert_eq!(registry.available_kinds(), vec![ModelKind::Covid]);
        assert!(registry.lookup(ModelKind::Covid).is_ok());
        assert!(matches!(
            registry.lookup(ModelKind::BrainTumor),
            Err(PredictionError::Unavailable(ModelKind::BrainTumor))
        ));
        let failure = registry.load_failure(ModelKind::BrainTumor).unwrap();
        assert!(matches!(failure.error, ModelLoadError::MissingFile(_)));
    }

    #[test]
    fn load_failure_names_path_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Brain_Tumor_MRI_Classifier.onnx");
        let config = ModelsConfig {
            paths: vec![(ModelKind::BrainTumor, missing.clone())],
            layout: TensorLayout::Nhwc,
        };
        let registry = ModelRegistry::load(&config);

        let failures = registry.load_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, ModelKind::BrainTumor);
        assert_eq!(failures[0].path, missing);
        let message = failures[0].to_string();
        assert!(message.starts_with(&format!(
            "Error loading model '{}' (brain_tumor): ",
            missing.display()
        )));
        assert!(registry.load_failure(ModelKind::Covid).is_none());
    }

    #[test]
    fn empty_registry_reports_every_kind() {
        let registry = ModelRegistry::default();
        assert!(registry.is_empty());
        let statuses = registry.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| !s.available));
        assert_eq!(statuses[0].model_type, "covid");
        assert_eq!(statuses[1].display_name, "Brain Tumor MRI");
    }

    #[test]
    fn entry_carries_kind_labels() {
        let entry = ModelEntry::new(ModelKind::BrainTumor, Arc::new(Fixed));
        assert_eq!(
            entry.class_labels(),
            ["glioma", "notumor", "meningioma", "pituitary"]
        );
    }
}
