//! Request handlers.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::language::DEFAULT_CLIENT_LANGUAGE;
use crate::ocr::DocumentKind;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

/// Multipart field carrying the client language code.
const LANGUAGE_FIELD: &str = "language";

/// Successful extraction response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    /// OCR engine language code actually used.
    pub language: String,
    /// Recognized text, or a description of why recognition failed.
    pub extracted_text: String,
}

/// The uploaded document.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Fields of interest from the multipart body.
#[derive(Default)]
struct Upload {
    file: Option<UploadedFile>,
    language: Option<String>,
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Extract text from an uploaded PDF or image.
/// POST /extract-text
pub async fn extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    // A body that isn't multipart can't carry a file
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("Rejected upload: {}", rejection);
            return Err(ApiError::NoFile);
        }
    };

    let upload = read_upload(multipart).await?;
    let file = upload.file.ok_or(ApiError::NoFile)?;

    let client_language = upload
        .language
        .unwrap_or_else(|| DEFAULT_CLIENT_LANGUAGE.to_string());
    let language = state.languages.resolve(Some(&client_language)).to_string();

    if file.bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    let kind = DocumentKind::from_filename(&file.filename);
    tracing::info!(
        "Extracting text from {:?} ({:?}, {} bytes, language {})",
        file.filename,
        kind,
        file.bytes.len(),
        language
    );

    let extractor = state.extractor.clone();
    let ocr_language = language.clone();
    let extraction =
        tokio::task::spawn_blocking(move || extractor.extract(kind, &file.bytes, &ocr_language))
            .await
            .map_err(|e| anyhow::anyhow!("extraction task failed: {}", e))?;

    if extraction.is_failure() {
        tracing::warn!("Extraction failed: {}", extraction);
    }
    let extracted_text = extraction.into_text();

    state.speech.notify(&extracted_text, &language);

    Ok(Json(ExtractTextResponse {
        language,
        extracted_text,
    }))
}

/// Read the file and language fields; other fields are skipped.
/// Only the first occurrence of each field counts.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) if upload.file.is_none() => {
                // A part without a filename is a plain form value, not a file
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let bytes = field.bytes().await?;
                upload.file = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some(LANGUAGE_FIELD) if upload.language.is_none() => {
                upload.language = Some(field.text().await?);
            }
            _ => {}
        }
    }

    Ok(upload)
}
