use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tract_onnx::prelude::*;

use crate::error::{ModelLoadError, PredictionError};
use crate::preprocess::{ImageTensor, CHANNELS, IMG_HEIGHT, IMG_WIDTH};

/// Anything that maps a normalized image tensor to one probability per class.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, PredictionError>;
}

/// Axis order the exported graph expects for its single input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TensorLayout {
    /// (1, 224, 224, 3), the Keras default.
    #[default]
    Nhwc,
    /// (1, 3, 224, 224), typical for PyTorch exports.
    Nchw,
}

impl TensorLayout {
    fn input_shape(self) -> [usize; 4] {
        let (h, w) = (IMG_HEIGHT as usize, IMG_WIDTH as usize);
        match self {
            TensorLayout::Nhwc => [1, h, w, CHANNELS],
            TensorLayout::Nchw => [1, CHANNELS, h, w],
        }
    }
}

/// A classifier backed by an ONNX graph executed with tract.
pub struct OnnxClassifier {
    path: PathBuf,
    layout: TensorLayout,
    model: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    /// Loads, optimizes and plans the graph at `path`.
    ///
    /// When the graph's output shape is fully known, its class count is
    /// checked against `expected_classes` here rather than on first use.
    pub fn load(
        path: impl AsRef<Path>,
        layout: TensorLayout,
        expected_classes: usize,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ModelLoadError::MissingFile(path));
        }

        let runtime_err = |e: TractError| ModelLoadError::Runtime {
            path: path.clone(),
            message: format!("{e:#}"),
        };

        let model = tract_onnx::onnx()
            .model_for_path(&path)
            .and_then(|m| m.with_input_fact(0, f32::fact(layout.input_shape()).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(runtime_err)?;

        let outputs = model
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|s| s.last().copied()));
        if let Some(outputs) = outputs {
            if outputs != expected_classes {
                return Err(ModelLoadError::LabelMismatch {
                    path,
                    outputs,
                    labels: expected_classes,
                });
            }
        }

        Ok(Self {
            path,
            layout,
            model,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_input(&self, input: &ImageTensor) -> Tensor {
        match self.layout {
            TensorLayout::Nhwc => input.view().to_owned().into_tensor(),
            TensorLayout::Nchw => input.to_nchw().into_tensor(),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, PredictionError> {
        let tensor = self.to_input(input);
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| PredictionError::Runtime(format!("{e:#}")))?;

        let output = outputs
            .first()
            .ok_or(PredictionError::EmptyOutput)?
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::Runtime(format!("{e:#}")))?;

        // Batch size is one, so the first row holds every class score.
        let probabilities: Vec<f32> = match output.ndim() {
            0 => vec![*output.iter().next().ok_or(PredictionError::EmptyOutput)?],
            1 => output.iter().copied().collect(),
            _ => output
                .outer_iter()
                .next()
                .ok_or(PredictionError::EmptyOutput)?
                .iter()
                .copied()
                .collect(),
        };
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_before_parsing() {
        let err = OnnxClassifier::load("/nonexistent/model.onnx", TensorLayout::Nhwc, 3)
            .err()
            .unwrap();
        assert!(matches!(err, ModelLoadError::MissingFile(_)));
    }

    #[test]
    fn corrupt_file_is_a_runtime_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"\x00\x01not a protobuf graph").unwrap();
        let err = OnnxClassifier::load(&path, TensorLayout::Nhwc, 3).err().unwrap();
        assert!(matches!(err, ModelLoadError::Runtime { .. }));
    }

    #[test]
    fn layouts_describe_their_input_shape() {
        assert_eq!(TensorLayout::Nhwc.input_shape(), [1, 224, 224, 3]);
        assert_eq!(TensorLayout::Nchw.input_shape(), [1, 3, 224, 224]);
    }
}
