use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::image::Handle;
use iced::widget::{button, column, container, pick_list, row, text, Image};
use iced::{Alignment, Color, Element, Length, Task, Theme};
use image::io::Reader as ImageReader;
use rfd::MessageLevel;

use super::dialogs::{alert, pick_image};
use super::{Message, ModelChoice};
use crate::inference::classify;
use crate::models::ModelKind;
use crate::registry::{LoadFailure, ModelRegistry};
use crate::workflow::{Outcome, Stage, Workflow};

const PREVIEW_SIZE: u32 = 400;
const BRAND: Color = Color {
    r: 0.0,
    g: 0.337,
    b: 0.702,
    a: 1.0,
};
const FAILURE: Color = Color {
    r: 0.863,
    g: 0.208,
    b: 0.271,
    a: 1.0,
};
const MUTED: Color = Color {
    r: 0.333,
    g: 0.333,
    b: 0.333,
    a: 1.0,
};

pub struct DiagnosisApp {
    registry: Arc<ModelRegistry>,
    workflow: Workflow,
    choices: Vec<ModelChoice>,
    preview: Option<Handle>,
}

impl DiagnosisApp {
    /// Builds the initial state and queues a warning for every model that
    /// failed to load. With nothing loaded the app reports it and exits.
    pub fn new(registry: Arc<ModelRegistry>) -> (Self, Task<Message>) {
        let available = registry.available_kinds();
        let mut startup = Vec::new();

        for failure in registry.load_failures() {
            startup.push(load_warning(failure));
        }
        if available.is_empty() {
            startup.push(Task::perform(
                alert(
                    MessageLevel::Error,
                    "No Models Available".to_string(),
                    "No machine learning models could be loaded. Application cannot function."
                        .to_string(),
                ),
                |_| Message::Exit,
            ));
        }

        let app = Self {
            registry,
            choices: available.iter().copied().map(ModelChoice).collect(),
            workflow: Workflow::new(available),
            preview: None,
        };
        (app, Task::batch(startup))
    }

    pub fn title(&self) -> String {
        "Medical Image Diagnosis".to_string()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ModelSelected(ModelChoice(kind)) => {
                self.workflow.select_model(kind);
                Task::none()
            }
            Message::BrowsePressed => Task::perform(pick_image(), Message::ImagePicked),
            Message::ImagePicked(Some(path)) => {
                self.workflow.image_selected(path.clone());
                self.preview = None;
                Task::perform(load_preview(path), |(path, preview)| {
                    Message::PreviewLoaded(path, preview)
                })
            }
            Message::ImagePicked(None) => {
                self.workflow.image_cleared();
                self.preview = None;
                Task::none()
            }
            // A preview for an image the user has since replaced is stale.
            Message::PreviewLoaded(path, _) if !self.workflow.is_current_image(&path) => {
                Task::none()
            }
            Message::PreviewLoaded(_, Ok(handle)) => {
                self.preview = Some(handle);
                Task::none()
            }
            Message::PreviewLoaded(_, Err(err)) => {
                self.workflow.image_cleared();
                self.preview = None;
                Task::perform(
                    alert(
                        MessageLevel::Error,
                        "Image Error".to_string(),
                        format!("Could not load image: {err}"),
                    ),
                    |_| Message::DialogClosed,
                )
            }
            Message::PredictPressed => match self.workflow.start_prediction() {
                Some((kind, path)) => Task::perform(
                    run_prediction(self.registry.clone(), kind, path),
                    Message::PredictionFinished,
                ),
                None => Task::none(),
            },
            Message::PredictionFinished(outcome) => {
                let dialog = match &outcome {
                    Outcome::Diagnosis(_) => None,
                    Outcome::ImageFailed(msg) => {
                        Some(("Image Processing Error", format!("Failed to process image: {msg}")))
                    }
                    Outcome::PredictionFailed(msg) => Some((
                        "Prediction Error",
                        format!("An error occurred during prediction: {msg}"),
                    )),
                };
                self.workflow.finish_prediction(outcome);
                match dialog {
                    Some((title, description)) => Task::perform(
                        alert(MessageLevel::Error, title.to_string(), description),
                        |_| Message::DialogClosed,
                    ),
                    None => Task::none(),
                }
            }
            Message::DialogClosed => Task::none(),
            Message::Exit => iced::exit(),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let busy = self.workflow.is_busy();

        let header = column![
            text("Diagnostic Vision and Smartscan Med").size(28).color(BRAND),
            text("Select a model and upload an image for diagnosis.").size(16),
        ]
        .spacing(8)
        .align_x(Alignment::Center);

        let picker = row![
            text("Choose Diagnosis Type:").size(16).color(BRAND),
            pick_list(
                self.choices.as_slice(),
                self.workflow.selected().map(ModelChoice),
                Message::ModelSelected,
            ),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let file_name = self
            .workflow
            .image_path()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "No file selected.".to_string());

        let controls = row![
            button("Browse...").on_press_maybe((!busy).then_some(Message::BrowsePressed)),
            text(file_name).size(16),
            button("Get Diagnosis")
                .on_press_maybe(self.workflow.can_predict().then_some(Message::PredictPressed)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let preview: Element<'_, Message> = match &self.preview {
            Some(handle) => Image::new(handle.clone())
                .width(Length::Fixed(PREVIEW_SIZE as f32))
                .height(Length::Fixed(PREVIEW_SIZE as f32))
                .into(),
            None => text("").into(),
        };

        let failed = matches!(
            self.workflow.stage(),
            Stage::ResultShown {
                outcome: Outcome::ImageFailed(_) | Outcome::PredictionFailed(_),
                ..
            }
        );
        let headline = text(self.workflow.headline())
            .size(18)
            .color(if failed { FAILURE } else { BRAND });

        let result = column![
            text("Diagnosis Result:").size(20).color(BRAND),
            headline,
            text(self.workflow.detail().unwrap_or_default()).size(16).color(MUTED),
        ]
        .spacing(6)
        .align_x(Alignment::Center);

        let content = column![
            header,
            picker,
            controls,
            container(preview).height(Length::Fixed(PREVIEW_SIZE as f32 + 20.0)),
            result,
        ]
        .spacing(16)
        .padding(20)
        .align_x(Alignment::Center);

        container(content).center(Length::Fill).into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn load_warning(failure: &LoadFailure) -> Task<Message> {
    let description = format!("{failure}\nThis model type will be unavailable.");
    Task::perform(
        alert(MessageLevel::Warning, "Model Load Error".to_string(), description),
        |_| Message::DialogClosed,
    )
}

async fn load_preview(path: PathBuf) -> (PathBuf, Result<Handle, String>) {
    let source = path.clone();
    let preview = tokio::task::spawn_blocking(move || {
        let img = ImageReader::open(&source)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| e.to_string())?
            .decode()
            .map_err(|e| e.to_string())?;
        let thumb = img.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE).to_rgba8();
        let (width, height) = thumb.dimensions();
        Ok(Handle::from_rgba(width, height, thumb.into_raw()))
    })
    .await
    .map_err(|e| e.to_string())
    .and_then(|preview| preview);
    (path, preview)
}

async fn run_prediction(registry: Arc<ModelRegistry>, kind: ModelKind, path: PathBuf) -> Outcome {
    tokio::task::spawn_blocking(move || Outcome::from(classify(&registry, kind, &path)))
        .await
        .unwrap_or_else(|e| Outcome::PredictionFailed(e.to_string()))
}
