use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::evaluation::orchestrator::EvaluationRequest;
use crate::evaluation::schema::SchemaVariant;
use crate::extraction::{DocumentFormat, DocumentRef};
use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or a value cannot be parsed.
#[derive(Debug, Clone)]
pub struct Config {
    pub jd_path: PathBuf,
    pub resume_path: PathBuf,
    /// Overrides extension-based format inference, e.g. for a PDF saved without `.pdf`.
    pub jd_format: Option<DocumentFormat>,
    pub resume_format: Option<DocumentFormat>,
    pub model_name: String,
    pub schema_variant: SchemaVariant,
    /// `None` runs offline: the model is never called and the default evaluation is used.
    pub ollama_url: Option<String>,
    pub model_timeout: Duration,
    pub model_max_retries: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let schema_variant = match lookup("SCHEMA_VARIANT") {
            Some(v) => v
                .parse::<SchemaVariant>()
                .map_err(anyhow::Error::msg)
                .context("SCHEMA_VARIANT must be 'basic' or 'detailed'")?,
            None => SchemaVariant::default(),
        };

        let declared_format = |key: &str| -> Result<Option<DocumentFormat>> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.parse::<DocumentFormat>().map_err(anyhow::Error::msg))
                .transpose()
                .with_context(|| format!("{key} must be 'txt', 'docx' or 'pdf'"))
        };

        let ollama_url = match lookup("OLLAMA_URL") {
            Some(v) if is_disabled(&v) => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_BASE_URL.to_string()),
        };

        let model_timeout_secs = lookup("MODEL_TIMEOUT_SECS")
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .context("MODEL_TIMEOUT_SECS must be a whole number of seconds")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let model_max_retries = lookup("MODEL_MAX_RETRIES")
            .map(|v| v.trim().parse::<u32>())
            .transpose()
            .context("MODEL_MAX_RETRIES must be a positive integer")?
            .unwrap_or(DEFAULT_MAX_RETRIES)
            .max(1);

        Ok(Config {
            jd_path: PathBuf::from(require("JD_PATH")?),
            resume_path: PathBuf::from(require("RESUME_PATH")?),
            jd_format: declared_format("JD_FORMAT")?,
            resume_format: declared_format("RESUME_FORMAT")?,
            model_name: lookup("MODEL_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            schema_variant,
            ollama_url,
            model_timeout: Duration::from_secs(model_timeout_secs),
            model_max_retries,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn evaluation_request(&self) -> EvaluationRequest {
        EvaluationRequest {
            jd: document_ref(&self.jd_path, self.jd_format),
            resume: document_ref(&self.resume_path, self.resume_format),
            model_name: self.model_name.clone(),
            schema_variant: self.schema_variant,
        }
    }
}

fn document_ref(path: &Path, format: Option<DocumentFormat>) -> DocumentRef {
    match format {
        Some(format) => DocumentRef::with_format(path, format),
        None => DocumentRef::new(path),
    }
}

fn is_disabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "off" | "disabled" | "none"
    )
}
