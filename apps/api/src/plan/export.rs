//! Markdown export of a generated plan.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::plan::models::PlanResponse;

/// `parcours-formation-<slug>.md`, where the slug is the lower-cased target job
/// with whitespace runs replaced by `-`. Only ASCII letters, digits and `-` are kept.
pub fn export_file_name(target_job: Option<&str>) -> String {
    let slug = target_job
        .map(|job| {
            job.to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|slug| !slug.trim_matches('-').is_empty())
        .unwrap_or_else(|| "plan".to_string());
    format!("parcours-formation-{slug}.md")
}

pub fn render_markdown(
    plan: &PlanResponse,
    target_job: Option<&str>,
    generated_on: NaiveDate,
) -> String {
    let mut out = String::new();

    // Writing into a String never fails.
    let _ = writeln!(
        out,
        "# Parcours de formation{}",
        target_job
            .map(|job| format!(" : {}", job.trim()))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "\n_Généré le {}_", generated_on.format("%d/%m/%Y"));

    let _ = writeln!(out, "\n## Analyse\n\n{}", plan.analysis.trim());

    if !plan.skills_gap.is_empty() {
        let _ = writeln!(out, "\n## Compétences à acquérir\n");
        for skill in &plan.skills_gap {
            let _ = writeln!(out, "- {skill}");
        }
    }

    let _ = writeln!(out, "\n## Parcours");
    for phase in &plan.learning_path {
        let _ = writeln!(out, "\n### {} ({})", phase.phase, phase.duration);
        for course in &phase.courses {
            let _ = write!(out, "\n- **{}**", course.title);
            let details: Vec<&str> = [
                course.provider.as_str(),
                course.duration.as_str(),
                course.level.as_str(),
            ]
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
            if !details.is_empty() {
                let _ = write!(out, " ({})", details.join(" · "));
            }
            out.push('\n');
            if !course.description.is_empty() {
                let _ = writeln!(out, "  {}", course.description);
            }
        }
    }

    let _ = writeln!(out, "\n## Durée totale estimée\n\n{}", plan.timeline);

    if !plan.tips.is_empty() {
        let _ = writeln!(out, "\n## Conseils\n");
        for tip in &plan.tips {
            let _ = writeln!(out, "- {tip}");
        }
    }

    out
}
