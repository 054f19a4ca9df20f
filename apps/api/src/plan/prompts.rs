// Prompt constants for plan generation.
// The prompt is in French, matching the audience of the product.

use crate::plan::models::PlanRequest;

/// Substituted for every absent optional field so the prompt keeps the same structure.
pub const NOT_SPECIFIED: &str = "Non spécifiée";

/// System prompt — enforces JSON-only output.
pub const PLAN_SYSTEM: &str = "Vous êtes un expert en reconversion professionnelle et formation. \
    Répondez uniquement en JSON valide.";

/// Plan prompt template.
/// Replace: {current_role}, {experience}, {skills}, {target_role}, {timeline}
pub const PLAN_PROMPT_TEMPLATE: &str = r#"En tant qu'expert en reconversion professionnelle, créez un parcours de formation personnalisé pour cette transition de carrière :

Profil actuel :
- Poste actuel : {current_role}
- Expérience : {experience}
- Compétences actuelles : {skills}

Objectif :
- Poste visé : {target_role}
- Délai souhaité : {timeline}

Veuillez fournir une réponse structurée en JSON avec les éléments suivants :
{
  "analysis": "Analyse de la transition (2-3 phrases)",
  "skills_gap": ["Compétence 1 à acquérir", "Compétence 2 à acquérir", "..."],
  "learning_path": [
    {
      "phase": "Phase 1 : Fondamentaux",
      "duration": "2-3 mois",
      "courses": [
        {
          "title": "Nom du cours",
          "provider": "Plateforme (Coursera, Udemy, etc.)",
          "duration": "Durée estimée",
          "level": "Débutant/Intermédiaire/Avancé",
          "description": "Description courte"
        }
      ]
    }
  ],
  "timeline": "Durée totale estimée",
  "tips": ["Conseil 1", "Conseil 2", "..."]
}"#;

/// Fills the template. Field values are embedded verbatim.
pub fn build_plan_prompt(request: &PlanRequest) -> String {
    let or_placeholder =
        |field: &Option<String>| field.as_deref().unwrap_or(NOT_SPECIFIED).to_string();

    // Single pass so that a value containing "{...}" is never substituted twice.
    let mut out = String::with_capacity(PLAN_PROMPT_TEMPLATE.len() + 256);
    let mut rest = PLAN_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let replacement = [
            ("{current_role}", request.current_role.clone()),
            ("{experience}", or_placeholder(&request.experience_band)),
            ("{skills}", or_placeholder(&request.skills_text)),
            ("{target_role}", request.target_role.clone()),
            ("{timeline}", or_placeholder(&request.timeline_hint)),
        ]
        .into_iter()
        .find(|(key, _)| tail.starts_with(key));

        match replacement {
            Some((key, value)) => {
                out.push_str(&value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
