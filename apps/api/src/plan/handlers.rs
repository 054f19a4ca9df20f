//! Axum route handlers for plan generation and export.

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::plan::export::{export_file_name, render_markdown};
use crate::plan::form::CareerPathForm;
use crate::plan::models::PlanResponse;
use crate::plan::upload::read_upload_form;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    /// The plan document as returned by the model.
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub target_job: Option<String>,
    pub plan: PlanResponse,
}

/// POST /api/generate-career-path
pub async fn handle_generate_career_path(
    State(state): State<AppState>,
    payload: Result<Json<CareerPathForm>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    generate(&state, form).await
}

/// POST /api/generate-career-path/upload
///
/// Same as the JSON route, but accepts multipart form fields and an optional `cv` file.
pub async fn handle_generate_from_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let form = read_upload_form(multipart).await?;
    generate(&state, form).await
}

async fn generate(
    state: &AppState,
    form: CareerPathForm,
) -> Result<Json<GenerateResponse>, AppError> {
    let request = form.into_plan_request()?;
    let generated = state.relay.generate_plan(&request).await?;

    Ok(Json(GenerateResponse {
        success: true,
        data: generated.document,
    }))
}

/// POST /api/export-career-path
///
/// Renders a plan as a downloadable Markdown document.
pub async fn handle_export_career_path(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let target_job = request.target_job.as_deref();
    let today = chrono::Local::now().date_naive();
    let body = render_markdown(&request.plan, target_job, today);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(target_job)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
