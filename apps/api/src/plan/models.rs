use serde::{Deserialize, Serialize};

/// Validated input of one plan generation. Optional fields are `None`, never blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanRequest {
    pub current_role: String,
    pub target_role: String,
    pub experience_band: Option<String>,
    pub skills_text: Option<String>,
    pub timeline_hint: Option<String>,
}

/// The learning plan returned by the model.
///
/// Field names follow the JSON keys the prompt asks for, so a plan that
/// deserializes here serializes back to the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub analysis: String,
    pub skills_gap: Vec<String>,
    pub learning_path: Vec<Phase>,
    /// Total estimated duration.
    pub timeline: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase name, e.g. "Phase 1 : Fondamentaux".
    pub phase: String,
    pub duration: String,
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub description: String,
}

/// A plan that passed the shape check.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    /// The JSON document exactly as parsed from the model output.
    pub document: serde_json::Value,
    pub plan: PlanResponse,
}

impl PlanResponse {
    pub fn course_count(&self) -> usize {
        self.learning_path.iter().map(|p| p.courses.len()).sum()
    }
}
