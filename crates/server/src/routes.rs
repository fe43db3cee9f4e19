use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{SecondsFormat, Utc};
use bytes::BytesMut;
use providers::proxy::{AnalyzedImage, HealthStatus, ImageAnalysisResult, MultipleImagesResult};
use providers::ImageInput;
use tracing::{error, info};

use super::{error::AppError, state::AppState};

pub const DEFAULT_PROMPT: &str = "Analyze this image and describe what you see";
pub const DEFAULT_BATCH_PROMPT: &str = "Analyze these images and describe what you see";

/// Files and prompt from one upload, validated before any provider call.
struct Upload {
    files: Vec<ImageInput>,
    prompt: Option<String>,
}

async fn read_upload(
    mut multipart: Multipart,
    file_fields: &[&str],
    max_files: usize,
    max_file_bytes: usize,
) -> Result<Upload, AppError> {
    let mut upload = Upload {
        files: Vec::new(),
        prompt: None,
    };

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "prompt" {
            upload.prompt = Some(field.text().await?);
            continue;
        }
        if !file_fields.contains(&name.as_str()) {
            continue;
        }

        let mime_type = field.content_type().unwrap_or_default().to_string();
        if !mime_type.starts_with("image/") {
            return Err(AppError::BadRequest("Only image files are allowed".into()));
        }
        if upload.files.len() == max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files, at most {max_files} allowed"
            )));
        }
        let filename = field.file_name().unwrap_or("image").to_string();
        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > max_file_bytes {
                return Err(AppError::TooLarge(format!(
                    "File too large, limit is {max_file_bytes} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }
        upload.files.push(ImageInput {
            filename,
            mime_type,
            data: data.freeze(),
        });
    }

    Ok(upload)
}

/// The default applies only when no `prompt` field was sent.
fn prompt_or(prompt: Option<String>, default: &str) -> String {
    prompt.unwrap_or_else(|| default.to_string())
}

pub async fn analyze_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ImageAnalysisResult>, AppError> {
    let upload = read_upload(multipart, &["image"], 1, state.config.max_file_bytes).await?;
    let image = upload
        .files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("No image file provided".into()))?;
    let prompt = prompt_or(upload.prompt, DEFAULT_PROMPT);

    let analysis = state.provider.analyze(&image, &prompt).await.map_err(|e| {
        error!(file = %image.filename, error = %e, "image analysis failed");
        AppError::Analysis {
            message: "Failed to analyze image",
            details: e.to_string(),
        }
    })?;
    info!(file = %image.filename, size = image.size(), "image analyzed");

    let size = image.size() as u64;
    Ok(Json(ImageAnalysisResult {
        success: true,
        analysis,
        filename: image.filename,
        size,
    }))
}

/// All-or-nothing: the first failing image fails the request.
pub async fn analyze_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<MultipleImagesResult>, AppError> {
    let upload = read_upload(
        multipart,
        &["images", "images[]"],
        state.config.max_files,
        state.config.max_file_bytes,
    )
    .await?;
    if upload.files.is_empty() {
        return Err(AppError::BadRequest("No image files provided".into()));
    }
    let prompt = prompt_or(upload.prompt, DEFAULT_BATCH_PROMPT);

    let mut results = Vec::with_capacity(upload.files.len());
    for image in &upload.files {
        let analysis = state.provider.analyze(image, &prompt).await.map_err(|e| {
            error!(file = %image.filename, error = %e, "batch analysis failed");
            AppError::Analysis {
                message: "Failed to analyze images",
                details: e.to_string(),
            }
        })?;
        results.push(AnalyzedImage {
            analysis,
            filename: image.filename.clone(),
            size: image.size() as u64,
        });
    }
    info!(count = results.len(), "images analyzed");

    Ok(Json(MultipleImagesResult {
        success: true,
        total_images: results.len(),
        results,
    }))
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
