//! Plan Relay — turns one validated `PlanRequest` into one completion call and its parsed plan.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::{
    strip_json_fences, CompletionRequest, CompletionService, LlmError, CODE_INSUFFICIENT_QUOTA,
    CODE_INVALID_API_KEY,
};
use crate::plan::models::{GeneratedPlan, PlanRequest, PlanResponse};
use crate::plan::prompts::{build_plan_prompt, PLAN_SYSTEM};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Les champs \"poste actuel\" et \"objectif professionnel\" sont requis";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("Upstream quota exhausted: {0}")]
    UpstreamQuota(String),

    #[error("Upstream returned an unusable plan: {reason}")]
    UpstreamFormat { reason: String, raw: String },

    #[error("Upstream call failed: {0}")]
    UpstreamUnknown(String),
}

impl From<LlmError> for RelayError {
    /// Known provider codes win over the HTTP status. Unrecognized codes fall through
    /// to the status, and anything else is `UpstreamUnknown`.
    fn from(e: LlmError) -> Self {
        match &e {
            LlmError::MissingApiKey => RelayError::UpstreamAuth(e.to_string()),
            LlmError::Api { code, status, .. } => match (code.as_deref(), status) {
                (Some(CODE_INVALID_API_KEY), _) => RelayError::UpstreamAuth(e.to_string()),
                (Some(CODE_INSUFFICIENT_QUOTA), _) => RelayError::UpstreamQuota(e.to_string()),
                (_, 401) => RelayError::UpstreamAuth(e.to_string()),
                (_, 429) => RelayError::UpstreamQuota(e.to_string()),
                _ => RelayError::UpstreamUnknown(e.to_string()),
            },
            LlmError::EmptyContent => RelayError::UpstreamFormat {
                reason: e.to_string(),
                raw: String::new(),
            },
            LlmError::Http(_) => RelayError::UpstreamUnknown(e.to_string()),
        }
    }
}

/// Fixed sampling parameters and the in-flight cap.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_concurrent: usize,
}

pub struct PlanRelay {
    completion: Arc<dyn CompletionService>,
    config: RelayConfig,
    in_flight: Semaphore,
}

impl PlanRelay {
    pub fn new(completion: Arc<dyn CompletionService>, config: RelayConfig) -> Self {
        let in_flight = Semaphore::new(config.max_concurrent.max(1));
        Self {
            completion,
            config,
            in_flight,
        }
    }

    /// Validates, prompts, calls the completion service exactly once, and parses the answer.
    pub async fn generate_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, RelayError> {
        validate(request)?;

        let request_id = Uuid::new_v4();
        let completion_request = CompletionRequest {
            model: self.config.model.clone(),
            system: PLAN_SYSTEM.to_string(),
            user: build_plan_prompt(request),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| RelayError::UpstreamUnknown(e.to_string()))?;

        info!(
            %request_id,
            "Generating plan: {} -> {}", request.current_role, request.target_role
        );

        let text = self
            .completion
            .complete(&completion_request)
            .await
            .map_err(|e| {
                warn!(%request_id, "Completion call failed: {e}");
                RelayError::from(e)
            })?;

        let generated = parse_plan(&text).map_err(|e| {
            warn!(%request_id, "{e}");
            e
        })?;

        info!(
            %request_id,
            "Plan generated: {} phases, {} courses",
            generated.plan.learning_path.len(),
            generated.plan.course_count()
        );
        Ok(generated)
    }
}

fn validate(request: &PlanRequest) -> Result<(), RelayError> {
    if request.current_role.trim().is_empty() || request.target_role.trim().is_empty() {
        return Err(RelayError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
    }
    Ok(())
}

/// Parses model output as JSON and checks it has the plan shape.
/// On failure the raw text is carried verbatim.
pub fn parse_plan(text: &str) -> Result<GeneratedPlan, RelayError> {
    let document: serde_json::Value =
        serde_json::from_str(strip_json_fences(text)).map_err(|e| RelayError::UpstreamFormat {
            reason: format!("invalid JSON: {e}"),
            raw: text.to_string(),
        })?;

    let plan = PlanResponse::deserialize(&document).map_err(|e| RelayError::UpstreamFormat {
        reason: format!("unexpected plan shape: {e}"),
        raw: text.to_string(),
    })?;

    Ok(GeneratedPlan { document, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{FakeCompletion, SAMPLE_PLAN_JSON};
    use crate::plan::prompts::NOT_SPECIFIED;

    fn config() -> RelayConfig {
        RelayConfig {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            max_concurrent: 4,
        }
    }

    fn relay(fake: &Arc<FakeCompletion>) -> PlanRelay {
        PlanRelay::new(fake.clone(), config())
    }

    fn request(current: &str, target: &str) -> PlanRequest {
        PlanRequest {
            current_role: current.to_string(),
            target_role: target.to_string(),
            ..Default::default()
        }
    }

    fn api(status: u16, code: Option<&str>) -> LlmError {
        LlmError::Api {
            status,
            code: code.map(String::from),
            message: "provider message".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_mandatory_fields_make_no_call() {
        let fake = Arc::new(FakeCompletion::text(SAMPLE_PLAN_JSON));
        let relay = relay(&fake);

        for (current, target) in [("", "Data Scientist"), ("Accountant", "  "), ("", "")] {
            let err = relay
                .generate_plan(&request(current, target))
                .await
                .unwrap_err();
            assert!(matches!(err, RelayError::Validation(_)));
        }
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_request_makes_exactly_one_call() {
        let fake = Arc::new(FakeCompletion::text(SAMPLE_PLAN_JSON));
        let relay = relay(&fake);

        let generated = relay
            .generate_plan(&request("Accountant", "Data Scientist"))
            .await
            .unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.system, PLAN_SYSTEM);
        assert_eq!(call.model, "gpt-3.5-turbo");
        assert_eq!(call.max_tokens, 2000);
        assert!(call.user.contains("Accountant"));
        assert!(call.user.contains("Data Scientist"));
        assert_eq!(call.user.matches(NOT_SPECIFIED).count(), 3);
        assert_eq!(generated.plan.learning_path.len(), 2);
    }

    #[tokio::test]
    async fn test_optional_fields_do_not_change_call_count() {
        let fake = Arc::new(FakeCompletion::text(SAMPLE_PLAN_JSON));
        let relay = relay(&fake);
        let full = PlanRequest {
            experience_band: Some("3-5 ans".to_string()),
            skills_text: Some("Excel".to_string()),
            timeline_hint: Some("6 mois".to_string()),
            ..request("Accountant", "Data Scientist")
        };

        relay.generate_plan(&full).await.unwrap();
        assert_eq!(fake.calls().len(), 1);
        assert!(!fake.calls()[0].user.contains(NOT_SPECIFIED));
    }

    #[tokio::test]
    async fn test_parsed_document_is_returned_unchanged() {
        let with_extra = SAMPLE_PLAN_JSON.replacen('{', "{\"confidence\": \"élevée\",", 1);
        let fake = Arc::new(FakeCompletion::text(&with_extra));

        let generated = relay(&fake)
            .generate_plan(&request("Accountant", "Data Scientist"))
            .await
            .unwrap();

        let expected: serde_json::Value = serde_json::from_str(&with_extra).unwrap();
        assert_eq!(generated.document, expected);
        assert_eq!(generated.document["confidence"], "élevée");
    }

    #[tokio::test]
    async fn test_non_json_output_keeps_raw_text() {
        let raw = "Désolé, je ne peux pas répondre en JSON.";
        let fake = Arc::new(FakeCompletion::text(raw));

        let err = relay(&fake)
            .generate_plan(&request("Accountant", "Data Scientist"))
            .await
            .unwrap_err();

        match err {
            RelayError::UpstreamFormat { raw: details, .. } => assert_eq!(details, raw),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_a_format_error() {
        let raw = r#"{"plan": "apprendre Python"}"#;
        match parse_plan(raw).unwrap_err() {
            RelayError::UpstreamFormat { reason, raw: details } => {
                assert!(reason.contains("shape"));
                assert_eq!(details, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let fenced = format!("```json\n{SAMPLE_PLAN_JSON}\n```");
        let generated = parse_plan(&fenced).unwrap();
        assert_eq!(generated.plan.timeline, "6-8 mois");
    }

    async fn classify(make: impl Fn() -> LlmError + Send + Sync + 'static) -> RelayError {
        let fake = Arc::new(FakeCompletion::failing(make));
        let err = relay(&fake)
            .generate_plan(&request("Accountant", "Data Scientist"))
            .await
            .unwrap_err();
        assert_eq!(fake.calls().len(), 1);
        err
    }

    #[tokio::test]
    async fn test_auth_failures_are_classified() {
        assert!(matches!(
            classify(|| LlmError::MissingApiKey).await,
            RelayError::UpstreamAuth(_)
        ));
        assert!(matches!(
            classify(|| api(401, Some(CODE_INVALID_API_KEY))).await,
            RelayError::UpstreamAuth(_)
        ));
        assert!(matches!(
            classify(|| api(401, None)).await,
            RelayError::UpstreamAuth(_)
        ));
    }

    #[tokio::test]
    async fn test_quota_failures_are_classified() {
        assert!(matches!(
            classify(|| api(429, Some(CODE_INSUFFICIENT_QUOTA))).await,
            RelayError::UpstreamQuota(_)
        ));
        assert!(matches!(
            classify(|| api(429, Some("rate_limit_exceeded"))).await,
            RelayError::UpstreamQuota(_)
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_failures_are_unknown() {
        assert!(matches!(
            classify(|| api(400, Some("context_length_exceeded"))).await,
            RelayError::UpstreamUnknown(_)
        ));
        assert!(matches!(
            classify(|| api(503, None)).await,
            RelayError::UpstreamUnknown(_)
        ));
        assert!(matches!(
            classify(|| LlmError::EmptyContent).await,
            RelayError::UpstreamFormat { .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let fake = Arc::new(FakeCompletion::text(SAMPLE_PLAN_JSON));
        let relay = PlanRelay::new(
            fake.clone(),
            RelayConfig {
                max_concurrent: 0,
                ..config()
            },
        );
        relay
            .generate_plan(&request("Accountant", "Data Scientist"))
            .await
            .unwrap();
        assert_eq!(fake.calls().len(), 1);
    }
}
