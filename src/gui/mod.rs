mod app;
mod dialogs;
mod message;

pub use app::DiagnosisApp;
pub use message::{Message, ModelChoice};
