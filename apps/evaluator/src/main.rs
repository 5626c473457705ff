mod config;
mod errors;
mod evaluation;
mod extraction;
mod llm_client;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::evaluation::orchestrator::Evaluator;
use crate::evaluation::schema::EvaluationResult;
use crate::extraction::BackendRegistry;
use crate::llm_client::{ModelClient, OllamaClient, UnavailableClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Structured logging goes to stderr; stdout carries only the evaluation JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume evaluator v{}", env!("CARGO_PKG_VERSION"));

    let registry = BackendRegistry::new();
    registry.log_availability();

    let model = build_model_client(&config).await?;
    let evaluator = Evaluator::new(registry, model);

    let result = evaluator
        .evaluate(&config.evaluation_request())
        .await
        .inspect_err(|e| error!(code = e.code(), "Evaluation aborted: {e}"))?;

    println!("{}", render(&result)?);

    Ok(())
}

/// Pretty-printed JSON. Non-ASCII text is written as-is, never `\u` escaped.
fn render(result: &EvaluationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Connects to Ollama, or returns the offline stand-in when `OLLAMA_URL` disables it.
async fn build_model_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    let Some(url) = &config.ollama_url else {
        warn!("Model client disabled by configuration; the default evaluation will be used");
        return Ok(Arc::new(UnavailableClient::new(
            "model client disabled by configuration",
        )));
    };

    let client = OllamaClient::new(url.as_str(), config.model_timeout)?
        .with_max_retries(config.model_max_retries);

    match client.probe(&config.model_name).await {
        Ok(true) => info!("Model {} is available at {url}", config.model_name),
        Ok(false) => warn!(
            "Model {} is not pulled at {url}; run `ollama pull {}`",
            config.model_name, config.model_name
        ),
        Err(e) => warn!("Cannot reach Ollama at {url}: {e}"),
    }

    Ok(Arc::new(client))
}
