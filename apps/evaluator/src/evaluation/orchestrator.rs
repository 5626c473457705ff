//! Evaluation Orchestrator: extract → compose → invoke → normalize, once per run.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::EvaluationError;
use crate::evaluation::composer::compose;
use crate::evaluation::normalizer::normalize;
use crate::evaluation::schema::{EvaluationResult, SchemaVariant};
use crate::extraction::{extract, BackendRegistry, DocumentRef, ExtractedText};
use crate::llm_client::ModelClient;

/// Everything one run needs, passed in explicitly rather than read from the environment.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub jd: DocumentRef,
    pub resume: DocumentRef,
    pub model_name: String,
    pub schema_variant: SchemaVariant,
}

pub struct Evaluator {
    registry: BackendRegistry,
    model: Arc<dyn ModelClient>,
}

impl Evaluator {
    pub fn new(registry: BackendRegistry, model: Arc<dyn ModelClient>) -> Self {
        Self { registry, model }
    }

    /// Runs the full pipeline. Only a missing input document fails the run; every other
    /// problem still produces a usable `EvaluationResult`.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let span = info_span!(
            "evaluation",
            run_id = %Uuid::new_v4(),
            model = %request.model_name,
            variant = %request.schema_variant
        );

        async move {
            info!("Reading documents...");
            let jd = self.extract_logged("job description", &request.jd)?;
            let resume = self.extract_logged("resume", &request.resume)?;

            info!("Building evaluation prompt...");
            let prompt = compose(&jd, &resume, request.schema_variant);

            info!("Calling model for evaluation...");
            let raw = self
                .model
                .invoke(prompt.as_str(), &request.model_name)
                .await;

            let result = normalize(&raw, request.schema_variant);
            info!(
                score = result.score,
                diagnostic = result.is_diagnostic(),
                "Evaluation complete"
            );
            Ok::<_, EvaluationError>(result)
        }
        .instrument(span)
        .await
    }

    fn extract_logged(
        &self,
        role: &str,
        doc: &DocumentRef,
    ) -> Result<ExtractedText, EvaluationError> {
        let extracted = extract(&self.registry, doc)?;
        if !extracted.is_ok() {
            warn!(
                status = ?extracted.status,
                path = %extracted.source.path.display(),
                "Using placeholder text for the {role}: {}",
                extracted.text
            );
        }
        Ok(extracted)
    }
}
