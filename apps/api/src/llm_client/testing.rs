//! In-memory `CompletionService` that records every request it receives.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionService, LlmError};

type Reply = Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>;

pub struct FakeCompletion {
    reply: Reply,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    /// Always answers with the given text.
    pub fn text(text: &str) -> Self {
        let text = text.to_string();
        Self::with(move || Ok(text.clone()))
    }

    /// Always fails with the error built by `make`.
    pub fn failing(make: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self::with(move || Err(make()))
    }

    fn with(reply: impl Fn() -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.reply)()
    }
}

/// A well-formed plan as the model is asked to produce it.
pub const SAMPLE_PLAN_JSON: &str = r#"{
  "analysis": "La transition de comptable vers data scientist s'appuie sur une solide base analytique.",
  "skills_gap": ["Python", "Statistiques appliquées", "Machine learning"],
  "learning_path": [
    {
      "phase": "Phase 1 : Fondamentaux",
      "duration": "2-3 mois",
      "courses": [
        {
          "title": "Python for Everybody",
          "provider": "Coursera",
          "duration": "8 semaines",
          "level": "Débutant",
          "description": "Bases de la programmation Python."
        }
      ]
    },
    {
      "phase": "Phase 2 : Machine learning",
      "duration": "3-4 mois",
      "courses": [
        {
          "title": "Machine Learning Specialization",
          "provider": "Coursera",
          "duration": "3 mois",
          "level": "Intermédiaire",
          "description": "Modèles supervisés et non supervisés."
        }
      ]
    }
  ],
  "timeline": "6-8 mois",
  "tips": ["Construire un portfolio sur GitHub", "Participer à des compétitions Kaggle"]
}"#;
