use std::fmt;
use std::path::PathBuf;

use iced::widget::image::Handle;

use crate::models::ModelKind;
use crate::workflow::Outcome;

/// Dropdown entry that renders a model by its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChoice(pub ModelKind);

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.display_name())
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    ModelSelected(ModelChoice),
    BrowsePressed,
    ImagePicked(Option<PathBuf>),
    PreviewLoaded(PathBuf, Result<Handle, String>),
    PredictPressed,
    PredictionFinished(Outcome),
    DialogClosed,
    Exit,
}
