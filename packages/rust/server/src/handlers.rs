use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::{info, instrument};
use uuid::Uuid;

use screenlens_core::{AnalyzeOptions, SilentProgress, normalize_image};
use screenlens_shared::{AnalysisResult, ScreenlensError};

use crate::error::ApiError;
use crate::state::AppState;

const MISSING_IMAGE: &str = "No image provided. Use field name \"image\".";
const TOO_LARGE: &str = "Upload exceeds the size limit.";

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// The `image` upload plus the optional prompt override.
struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
    filename: Option<String>,
    prompt: Option<String>,
}

/// Body-limit hits become 413; every other multipart failure is a 400.
fn upload_error(e: MultipartError, context: &str) -> ScreenlensError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ScreenlensError::payload_too_large(TOO_LARGE)
    } else {
        ScreenlensError::bad_request(format!("{context}: {e}"))
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, ScreenlensError> {
    let mut image = None;
    let mut prompt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Failed to read upload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(String::from);
                let filename = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| upload_error(e, "Failed to read image data"))?;
                image = Some((bytes.to_vec(), content_type, filename));
            }
            "prompt" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| upload_error(e, "Failed to read prompt"))?;
                prompt = Some(text).filter(|p| !p.trim().is_empty());
            }
            _ => {}
        }
    }

    Ok(image.map(|(bytes, content_type, filename)| Upload {
        bytes,
        content_type,
        filename,
        prompt,
    }))
}

/// `POST /analyze`: multipart `image` (required) and `prompt` (optional).
#[instrument(skip_all, fields(request_id = %Uuid::now_v7()))]
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let pipeline = state.pipeline()?;

    let multipart = multipart.map_err(|_| ScreenlensError::bad_request(MISSING_IMAGE))?;
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ScreenlensError::bad_request(MISSING_IMAGE))?;

    let image = normalize_image(
        upload.bytes,
        upload.content_type.as_deref(),
        upload.filename.as_deref(),
    )?;
    info!(mime = %image.mime, bytes = image.bytes.len(), "upload accepted");

    let options = AnalyzeOptions {
        prompt: upload.prompt,
        enrich: true,
    };
    let result = pipeline
        .analyze_screenshot(&image, &options, &SilentProgress)
        .await?;
    Ok(Json(result))
}
