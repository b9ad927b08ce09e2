use std::io::Write;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use futures_util::StreamExt;
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ClassifyError, ImageProcessingError, PredictionError};
use crate::inference::classify;
use crate::models::{ErrorResponse, ModelKind, PredictionResponse};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

/// Uploads larger than this are rejected while streaming.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model for {0} not loaded.")]
    ModelNotLoaded(String),
    #[error("No file uploaded.")]
    NoFile,
    #[error("Empty filename.")]
    EmptyFilename,
    #[error("Invalid form data: {0}")]
    Form(String),
    #[error("Uploaded file exceeds {} bytes.", MAX_UPLOAD_BYTES)]
    TooLarge,
    #[error("Image processing error: {0}")]
    Image(#[from] ImageProcessingError),
    #[error("Prediction failed: {0}")]
    Prediction(PredictionError),
    #[error("Could not save file: {0}")]
    Upload(std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Image(e) => ApiError::Image(e),
            ClassifyError::Prediction(PredictionError::Unavailable(kind)) => {
                ApiError::ModelNotLoaded(kind.id().to_string())
            }
            ClassifyError::Prediction(e) => ApiError::Prediction(e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::EmptyFilename | ApiError::Form(_) | ApiError::Image(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ModelNotLoaded(_)
            | ApiError::Prediction(_)
            | ApiError::Upload(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct PredictForm {
    model_type: Option<String>,
    file: Option<Upload>,
}

/// Mounts every route of the web shell.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/static/script.js").route(web::get().to(script)))
        .service(web::resource("/models").route(web::get().to(list_models)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn script() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(SCRIPT_JS)
}

pub async fn list_models(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.registry.statuses())
}

pub async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_form(&mut payload).await?;

    // Resolve the model before anything reaches the disk.
    let model_type = form.model_type.unwrap_or_default();
    let kind = match model_type.parse::<ModelKind>() {
        Ok(kind) if state.registry.lookup(kind).is_ok() => kind,
        _ => {
            log::warn!("Rejected prediction for unavailable model '{model_type}'");
            return Err(ApiError::ModelNotLoaded(model_type));
        }
    };

    let upload = form.file.ok_or(ApiError::NoFile)?;
    if upload.filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }

    let state = state.into_inner();
    let result = web::block(move || -> Result<_, ApiError> {
        // Dropping the temp file removes it, whichever way classification ends.
        let temp = save_upload(&state.upload_dir, &upload.bytes)?;
        classify(&state.registry, kind, temp.path()).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| {
        log::warn!("Prediction with {kind} failed: {e}");
        e
    })?;

    Ok(HttpResponse::Ok().json(PredictionResponse::from(&result)))
}

async fn read_form(payload: &mut Multipart) -> Result<PredictForm, ApiError> {
    let mut form = PredictForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::Form(e.to_string()))?;
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::Form(e.to_string()))?;
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::TooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "model_type" => {
                form.model_type = Some(String::from_utf8_lossy(&data).trim().to_string());
            }
            "file" if form.file.is_none() => {
                form.file = Some(Upload {
                    filename: disposition.get_filename().unwrap_or_default().to_string(),
                    bytes: data,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn save_upload(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile, ApiError> {
    std::fs::create_dir_all(dir).map_err(ApiError::Upload)?;
    let mut file = Builder::new()
        .prefix(&format!("{}-", Uuid::new_v4()))
        .tempfile_in(dir)
        .map_err(ApiError::Upload)?;
    file.write_all(bytes).map_err(ApiError::Upload)?;
    file.flush().map_err(ApiError::Upload)?;
    Ok(file)
}
