use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The diagnostic classifiers this crate knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Covid,
    BrainTumor,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Covid, ModelKind::BrainTumor];

    /// Identifier used in form fields and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            ModelKind::Covid => "covid",
            ModelKind::BrainTumor => "brain_tumor",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Covid => "COVID-19 X-ray",
            ModelKind::BrainTumor => "Brain Tumor MRI",
        }
    }

    /// Class labels in the order of the classifier's output vector.
    pub fn class_labels(self) -> &'static [&'static str] {
        match self {
            ModelKind::Covid => &["COVID", "Normal", "Pneumonia"],
            ModelKind::BrainTumor => &["glioma", "notumor", "meningioma", "pituitary"],
        }
    }

    pub fn default_model_path(self) -> &'static str {
        match self {
            ModelKind::Covid => "trained_medical_models/COVID19_XRay_Classifier.onnx",
            ModelKind::BrainTumor => "trained_medical_models/Brain_Tumor_MRI_Classifier.onnx",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model type '{0}'")]
pub struct UnknownModelKind(pub String);

impl FromStr for ModelKind {
    type Err = UnknownModelKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownModelKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub class_name: String,
    pub confidence: f32,
}

impl PredictionResult {
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub confidence: String,
}

impl From<&PredictionResult> for PredictionResponse {
    fn from(result: &PredictionResult) -> Self {
        Self {
            prediction: result.class_name.clone(),
            confidence: format!("{:.2}", result.confidence),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One row of `GET /models`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_type: String,
    pub display_name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_identifiers() {
        assert_eq!("covid".parse::<ModelKind>(), Ok(ModelKind::Covid));
        assert_eq!("brain_tumor".parse::<ModelKind>(), Ok(ModelKind::BrainTumor));
        assert_eq!(
            "unknown_type".parse::<ModelKind>(),
            Err(UnknownModelKind("unknown_type".to_string()))
        );
    }

    #[test]
    fn response_formats_two_decimals() {
        let result = PredictionResult {
            class_name: "COVID".to_string(),
            confidence: 0.8149,
        };
        let response = PredictionResponse::from(&result);
        assert_eq!(response.prediction, "COVID");
        assert_eq!(response.confidence, "0.81");
        assert_eq!(format!("{:.2}", result.confidence_percent()), "81.49");
    }

    #[test]
    fn available_status_omits_error() {
        let status = ModelStatus {
            model_type: ModelKind::Covid.id().to_string(),
            display_name: ModelKind::Covid.display_name().to_string(),
            available: true,
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({
                "model_type": "covid",
                "display_name": "COVID-19 X-ray",
                "available": true,
            })
        );
    }
}
