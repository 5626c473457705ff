//! Response Normalizer: turns raw model text into an `EvaluationResult`.
//!
//! Two stages:
//! 1. `canonicalize` trims the text, drops a leading `<think>…</think>` reasoning block and
//!    strips Markdown code fences.
//! 2. `parse_evaluation` deserializes the canonical text into the typed schema, which rounds
//!    and clamps scores into 0..=100. If the strict parse fails, the outermost `{…}` slice is
//!    tried once before giving up.
//!
//! `normalize` never fails: an unreachable model yields the default evaluation and
//! unparseable text yields the diagnostic evaluation carrying the raw text.

use thiserror::Error;
use tracing::{debug, warn};

use crate::evaluation::defaults::{default_evaluation, diagnostic_evaluation};
use crate::evaluation::schema::{EvaluationResult, SchemaVariant};
use crate::llm_client::RawModelResponse;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("response is empty")]
    Empty,

    #[error("response is not a valid evaluation: {0}")]
    Invalid(#[from] serde_json::Error),
}

pub fn normalize(raw: &RawModelResponse, variant: SchemaVariant) -> EvaluationResult {
    if !raw.is_ok() {
        warn!(
            status = ?raw.status,
            error = raw.error.as_deref().unwrap_or(""),
            "Model call did not complete, using the default evaluation"
        );
        return default_evaluation(variant);
    }

    match parse_evaluation(&raw.text) {
        Ok(result) => {
            if variant == SchemaVariant::Detailed && result.detailed_analysis.is_none() {
                warn!("Model response has no detailed_analysis section");
            }
            debug!(score = result.score, "Model response parsed");
            result
        }
        Err(e) => {
            warn!("Model response could not be parsed: {e}");
            diagnostic_evaluation(variant, &raw.text)
        }
    }
}

pub fn parse_evaluation(text: &str) -> Result<EvaluationResult, NormalizeError> {
    let canonical = canonicalize(text);
    if canonical.is_empty() {
        return Err(NormalizeError::Empty);
    }

    match serde_json::from_str::<EvaluationResult>(canonical) {
        Ok(result) => Ok(result),
        Err(strict_error) => match embedded_object(canonical) {
            Some(object) if object.len() < canonical.len() => {
                debug!("Strict parse failed, retrying with the embedded JSON object");
                serde_json::from_str(object).map_err(|_| NormalizeError::Invalid(strict_error))
            }
            _ => Err(NormalizeError::Invalid(strict_error)),
        },
    }
}

/// Trims, drops a leading reasoning block and strips code fences. Idempotent.
pub fn canonicalize(text: &str) -> &str {
    strip_fences(strip_reasoning(text.trim()))
}

fn strip_reasoning(text: &str) -> &str {
    if !text.starts_with(THINK_OPEN) {
        return text;
    }
    match text.find(THINK_CLOSE) {
        Some(end) => text[end + THINK_CLOSE.len()..].trim_start(),
        None => text,
    }
}

/// Strips a leading "```json" / "```" marker and a trailing "```" marker, each if present.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest),
        None => text,
    };
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
