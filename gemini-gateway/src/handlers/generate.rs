use crate::dtos::{GenerateResponse, GenerateTextRequest};
use crate::models::AttachmentKind;
use crate::services::providers::{ContentPart, ProviderError};
use crate::services::uploads::multipart_error;
use crate::services::{StagedUpload, UploadStaging};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

const TEXT_PROMPT_REQUIRED: &str = "Prompt is required for text generation.";
const TEXT_FALLBACK_ERROR: &str = "An error occurred during text generation.";
const PROMPT_FIELD: &str = "prompt";

pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let payload = match payload {
        Ok(Json(body)) => Some(body),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(AppError::PayloadTooLarge(rejection.body_text()));
        }
        // An unparseable body is treated like one without a prompt.
        Err(_) => None,
    };

    let prompt = payload
        .and_then(|body| body.prompt)
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::Error::msg(TEXT_PROMPT_REQUIRED)))?;

    let model = &state.config.models.text_model;
    let parts = [ContentPart::Text(prompt)];

    match state.provider.generate(model, &parts).await {
        Ok(generation) => Ok(Json(GenerateResponse {
            output: generation.text,
        })),
        Err(e) => {
            tracing::error!(model = %model, error = %e, "Error generating text");
            Err(provider_error(&e, TEXT_FALLBACK_ERROR))
        }
    }
}

pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(&state, AttachmentKind::Image, multipart).await
}

pub async fn generate_from_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(&state, AttachmentKind::Document, multipart).await
}

pub async fn generate_from_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(&state, AttachmentKind::Audio, multipart).await
}

/// Fields collected from an attachment form.
struct AttachmentForm {
    prompt: Option<String>,
    upload: Option<StagedUpload>,
}

async fn generate_from_attachment(
    state: &AppState,
    kind: AttachmentKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let missing_input = || AppError::BadRequest(anyhow::Error::msg(kind.missing_input_message()));

    // A body that is not multipart at all carries neither field.
    let multipart = multipart.map_err(|_| missing_input())?;
    let form = read_attachment_form(&state.uploads, kind, multipart).await?;

    let (prompt, upload) = match (form.prompt.filter(|p| !p.is_empty()), form.upload) {
        (Some(prompt), Some(upload)) => (prompt, upload),
        (_, upload) => {
            if let Some(upload) = upload {
                upload.remove().await;
            }
            return Err(missing_input());
        }
    };

    tracing::info!(
        kind = kind.field_name(),
        file_name = %upload.file_name(),
        mime_type = %upload.mime_type(),
        size = upload.size(),
        "Generating content from upload"
    );

    let outcome = generate_with_upload(state, kind, prompt, &upload).await;
    upload.remove().await;

    outcome.map(Json)
}

async fn read_attachment_form(
    uploads: &UploadStaging,
    kind: AttachmentKind,
    mut multipart: Multipart,
) -> Result<AttachmentForm, AppError> {
    let mut form = AttachmentForm {
        prompt: None,
        upload: None,
    };

    // On any error the partially built form is dropped, which deletes a file
    // staged so far.
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        let is_file = field.file_name().is_some();

        match name.as_deref() {
            Some(PROMPT_FIELD) if !is_file => {
                form.prompt = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(name) if is_file && name == kind.field_name() && form.upload.is_none() => {
                form.upload = Some(uploads.stage(field).await?);
            }
            other => {
                tracing::debug!(field = ?other, "Skipping multipart field");
            }
        }
    }

    Ok(form)
}

async fn generate_with_upload(
    state: &AppState,
    kind: AttachmentKind,
    prompt: String,
    upload: &StagedUpload,
) -> Result<GenerateResponse, AppError> {
    let model = state.config.models.model_for(kind);

    let bytes = upload.read().await.map_err(|e| {
        tracing::error!(error = %e, "{}", kind.failure_log_message());
        upstream_error(e.to_string(), kind.fallback_error_message())
    })?;

    let parts = [
        ContentPart::Text(prompt),
        ContentPart::inline_data(upload.mime_type(), &bytes),
    ];
    drop(bytes);

    let generation = state.provider.generate(model, &parts).await.map_err(|e| {
        tracing::error!(model = %model, error = %e, "{}", kind.failure_log_message());
        provider_error(&e, kind.fallback_error_message())
    })?;

    Ok(GenerateResponse {
        output: generation.text,
    })
}

/// Surface the provider's error, or `fallback` when the provider gave no
/// message of its own.
fn provider_error(err: &ProviderError, fallback: &str) -> AppError {
    let message = if err.detail().trim().is_empty() {
        String::new()
    } else {
        err.to_string()
    };
    upstream_error(message, fallback)
}

/// Surface `message` to the caller, or `fallback` when it is blank.
fn upstream_error(message: String, fallback: &str) -> AppError {
    if message.trim().is_empty() {
        AppError::UpstreamError(fallback.to_string())
    } else {
        AppError::UpstreamError(message)
    }
}
