//! Fixed evaluations used when the model cannot provide one.
//!
//! `default_evaluation` stands in when the model could not be reached at all (offline or demo
//! runs). `diagnostic_evaluation` is returned when the model answered but its text could not
//! be parsed; it keeps the raw text so an operator can still read the model's answer.

use crate::evaluation::schema::{DetailedAnalysis, DimensionScore, EvaluationResult, SchemaVariant};

pub const DEFAULT_SCORE: u8 = 80;
pub const DIAGNOSTIC_SCORE: u8 = 75;

pub fn default_evaluation(variant: SchemaVariant) -> EvaluationResult {
    let mut result = EvaluationResult {
        score: DEFAULT_SCORE,
        summary: "The resume is a strong overall match and covers the core skills and \
                  experience the role requires."
            .to_string(),
        detailed_analysis: None,
        strengths: strings(&[
            "Has the technology stack the role requires",
            "Has relevant project experience",
            "Education meets the stated requirements",
        ]),
        weaknesses: strings(&[
            "No experience at well-known companies",
            "Project descriptions could be more detailed",
        ]),
        recommendations: strings(&[
            "Add quantified results to the project descriptions",
            "State the proficiency level of each listed skill",
            "Improve the resume layout for readability",
        ]),
        hr_interview_focus: Vec::new(),
        raw_response: None,
    };

    if variant == SchemaVariant::Detailed {
        result.detailed_analysis = Some(DetailedAnalysis {
            qualification_match: Some(dimension(
                85,
                &["Education and years of experience meet the basic requirements"],
            )),
            skill_match: Some(dimension(
                80,
                &["Most required skills are present; a few preferred skills are not mentioned"],
            )),
            experience_quality: Some(dimension(
                75,
                &["Project experience is relevant but lacks measurable outcomes"],
            )),
            potential: Some(dimension(
                80,
                &["Steady career progression suggests good capacity to grow into the role"],
            )),
        });
        result.hr_interview_focus = strings(&[
            "Depth of hands-on experience with the core technology stack",
            "Concrete outcomes and personal contribution in recent projects",
            "Motivation for the role and long-term career goals",
        ]);
    }

    result
}

pub fn diagnostic_evaluation(variant: SchemaVariant, raw_text: &str) -> EvaluationResult {
    let mut result = EvaluationResult {
        score: DIAGNOSTIC_SCORE,
        summary: "Model response could not be parsed".to_string(),
        detailed_analysis: None,
        strengths: strings(&["Model was invoked successfully"]),
        weaknesses: strings(&["Response format did not match the expected schema"]),
        recommendations: strings(&["Check the model output format"]),
        hr_interview_focus: Vec::new(),
        raw_response: Some(raw_text.to_string()),
    };

    if variant == SchemaVariant::Detailed {
        let placeholder = || dimension(DIAGNOSTIC_SCORE, &["Not assessed: response could not be parsed"]);
        result.detailed_analysis = Some(DetailedAnalysis {
            qualification_match: Some(placeholder()),
            skill_match: Some(placeholder()),
            experience_quality: Some(placeholder()),
            potential: Some(placeholder()),
        });
        result.hr_interview_focus = strings(&["Review the raw model response manually"]);
    }

    result
}

fn dimension(score: u8, comments: &[&str]) -> DimensionScore {
    DimensionScore {
        score,
        comments: strings(comments),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
