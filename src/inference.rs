use std::path::Path;

use crate::error::{ClassifyError, PredictionError};
use crate::models::{ModelKind, PredictionResult};
use crate::preprocess::{preprocess_image, ImageTensor};
use crate::registry::{ModelEntry, ModelRegistry};

/// Picks the most probable label. Equal maxima resolve to the lower index and
/// NaN scores never win.
pub fn decode(probabilities: &[f32], labels: &[String]) -> Result<PredictionResult, PredictionError> {
    if probabilities.is_empty() {
        return Err(PredictionError::EmptyOutput);
    }
    if probabilities.len() != labels.len() {
        return Err(PredictionError::LabelMismatch {
            outputs: probabilities.len(),
            labels: labels.len(),
        });
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in probabilities.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((index, value)),
        }
    }

    let (index, confidence) = best.ok_or(PredictionError::NotANumber)?;
    Ok(PredictionResult {
        class_name: labels[index].clone(),
        confidence,
    })
}

pub fn predict(entry: &ModelEntry, input: &ImageTensor) -> Result<PredictionResult, PredictionError> {
    let probabilities = entry.classifier().predict(input)?;
    decode(&probabilities, entry.class_labels())
}

/// Runs the whole chain for one image: lookup, preprocess, infer, decode.
///
/// The model is resolved before the file is touched, so an unavailable model
/// never costs a decode.
pub fn classify(
    registry: &ModelRegistry,
    kind: ModelKind,
    image_path: &Path,
) -> Result<PredictionResult, ClassifyError> {
    let entry = registry.lookup(kind)?;
    let input = preprocess_image(image_path)?;
    let result = predict(entry, &input)?;
    log::info!(
        "{kind}: predicted {} ({:.2}) for {}",
        result.class_name,
        result.confidence,
        image_path.display()
    );
    Ok(result)
}
