//! Form Collector — the inbound body of a plan request and its presence gate.

use serde::Deserialize;

use crate::plan::models::PlanRequest;
use crate::plan::relay::{RelayError, MISSING_FIELDS_MESSAGE};

/// Body of `POST /api/generate-career-path`. Field names match the web client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathForm {
    pub current_job: Option<String>,
    pub target_job: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<String>,
    pub timeline: Option<String>,
}

impl CareerPathForm {
    /// Appends text extracted from an uploaded CV to the skills field.
    pub fn attach_cv_text(&mut self, cv_text: &str) {
        let cv_text = cv_text.trim();
        if cv_text.is_empty() {
            return;
        }
        self.skills = match non_blank(self.skills.take()) {
            Some(skills) => Some(format!("{skills}\n\n{cv_text}")),
            None => Some(cv_text.to_string()),
        };
    }

    /// Trims every field, drops blank optional ones and requires both job fields.
    pub fn into_plan_request(self) -> Result<PlanRequest, RelayError> {
        let (Some(current_role), Some(target_role)) =
            (non_blank(self.current_job), non_blank(self.target_job))
        else {
            return Err(RelayError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        };

        Ok(PlanRequest {
            current_role,
            target_role,
            experience_band: non_blank(self.experience),
            skills_text: non_blank(self.skills),
            timeline_hint: non_blank(self.timeline),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
