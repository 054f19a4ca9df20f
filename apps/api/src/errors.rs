use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::plan::relay::RelayError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Bodies are `{ "error": message }`, plus `details` for upstream failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Route not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Relay(RelayError::Validation(msg)) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::PayloadTooLarge => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Fichier trop volumineux (max 5MB)" }),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Route non trouvée" }),
            ),
            AppError::Relay(RelayError::UpstreamAuth(msg)) => {
                tracing::error!("LLM authentication error: {msg}");
                (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Clé API OpenAI invalide. Vérifiez la variable OPENAI_API_KEY du serveur." }),
                )
            }
            AppError::Relay(RelayError::UpstreamQuota(msg)) => {
                tracing::error!("LLM quota error: {msg}");
                (
                    StatusCode::PAYMENT_REQUIRED,
                    json!({ "error": "Quota API OpenAI dépassé. Veuillez réessayer plus tard." }),
                )
            }
            AppError::Relay(RelayError::UpstreamFormat { reason, raw }) => {
                tracing::error!("LLM format error: {reason}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Erreur lors du traitement de la réponse IA",
                        "details": raw
                    }),
                )
            }
            AppError::Relay(RelayError::UpstreamUnknown(msg)) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Erreur lors de la génération du parcours",
                        "details": msg
                    }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Erreur interne du serveur" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
