//! Multipart variant of the plan form, with an optional CV file.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::plan::form::CareerPathForm;

/// Ceiling for the uploaded CV file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Room for the text fields and part headers on top of the file.
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Ceiling for the whole multipart body.
pub const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES;

const CV_FIELD: &str = "cv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvKind {
    Pdf,
    Text,
}

impl CvKind {
    /// Accepts PDF and any `text/*`. Generic or missing content types fall back to the extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, AppError> {
        match content_type {
            Some("application/pdf") => return Ok(CvKind::Pdf),
            Some(ct) if ct.starts_with("text/") => return Ok(CvKind::Text),
            Some("application/octet-stream") | None => {}
            Some(_) => return Err(unsupported()),
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(CvKind::Pdf),
            Some("txt") | Some("md") => Ok(CvKind::Text),
            _ => Err(unsupported()),
        }
    }
}

fn unsupported() -> AppError {
    AppError::BadRequest("Type de fichier non supporté".to_string())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads the text fields and the optional `cv` file into a `CareerPathForm`.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<CareerPathForm, AppError> {
    let mut form = CareerPathForm::default();
    let mut cv_text = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == CV_FIELD {
            let kind = CvKind::detect(field.content_type(), field.file_name())?;
            let data = field.bytes().await.map_err(multipart_error)?;
            if data.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::PayloadTooLarge);
            }
            debug!("Received CV upload ({kind:?}, {} bytes)", data.len());
            cv_text = Some(extract_cv_text(kind, data).await?);
            continue;
        }

        let slot = match name.as_str() {
            "currentJob" => &mut form.current_job,
            "targetJob" => &mut form.target_job,
            "experience" => &mut form.experience,
            "skills" => &mut form.skills,
            "timeline" => &mut form.timeline,
            other => {
                debug!("Ignoring multipart field '{other}'");
                continue;
            }
        };
        *slot = Some(field.text().await.map_err(multipart_error)?);
    }

    if let Some(text) = cv_text {
        form.attach_cv_text(&text);
    }
    Ok(form)
}

/// Turns an uploaded CV into plain text. PDF parsing runs on the blocking pool.
pub async fn extract_cv_text(kind: CvKind, data: Bytes) -> Result<String, AppError> {
    match kind {
        CvKind::Text => Ok(String::from_utf8_lossy(&data).into_owned()),
        CvKind::Pdf => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| {
                warn!("PDF text extraction failed: {e:?}");
                AppError::BadRequest("Impossible de lire le fichier PDF".to_string())
            }),
    }
}
