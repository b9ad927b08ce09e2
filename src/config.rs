use std::path::PathBuf;

use clap::Args;

use crate::classifier::TensorLayout;
use crate::models::ModelKind;
use crate::registry::ModelsConfig;

/// Model locations shared by the web server and the desktop app.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// ONNX export of the chest X-ray classifier
    #[arg(
        long,
        env = "MEDSCAN_COVID_MODEL",
        value_name = "PATH",
        default_value = ModelKind::Covid.default_model_path()
    )]
    pub covid_model: PathBuf,

    /// ONNX export of the brain MRI classifier
    #[arg(
        long,
        env = "MEDSCAN_BRAIN_TUMOR_MODEL",
        value_name = "PATH",
        default_value = ModelKind::BrainTumor.default_model_path()
    )]
    pub brain_tumor_model: PathBuf,

    /// Axis order of the models' image input
    #[arg(long, value_enum, default_value_t = TensorLayout::Nhwc)]
    pub input_layout: TensorLayout,
}

impl ModelArgs {
    pub fn models_config(&self) -> ModelsConfig {
        ModelsConfig {
            paths: vec![
                (ModelKind::Covid, self.covid_model.clone()),
                (ModelKind::BrainTumor, self.brain_tumor_model.clone()),
            ],
            layout: self.input_layout,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    #[arg(long, env = "MEDSCAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "MEDSCAN_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory for in-flight uploads; created if missing
    #[arg(long, env = "MEDSCAN_UPLOAD_DIR", value_name = "DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
