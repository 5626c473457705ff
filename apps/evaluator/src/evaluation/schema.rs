//! Evaluation result types and the JSON examples the prompt shows the model.
//!
//! The example constants are the contract between the Prompt Composer and the Response
//! Normalizer: both sides read them from here and the normalizer tests parse them back.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Schema variant
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    Basic,
    #[default]
    Detailed,
}

impl SchemaVariant {
    /// The literal JSON example embedded in the prompt for this variant.
    pub fn schema_example(&self) -> &'static str {
        match self {
            SchemaVariant::Basic => BASIC_SCHEMA_EXAMPLE,
            SchemaVariant::Detailed => DETAILED_SCHEMA_EXAMPLE,
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SchemaVariant::Basic),
            "detailed" => Ok(SchemaVariant::Detailed),
            other => Err(format!(
                "unknown schema variant '{other}' (expected 'basic' or 'detailed')"
            )),
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVariant::Basic => write!(f, "basic"),
            SchemaVariant::Detailed => write!(f, "detailed"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Schema examples (shown to the model verbatim)
// ────────────────────────────────────────────────────────────────────────────

pub const BASIC_SCHEMA_EXAMPLE: &str = r#"{
  "score": 85,
  "summary": "A short summary of how well the resume matches the job description",
  "strengths": ["Strength 1", "Strength 2"],
  "weaknesses": ["Weakness 1", "Weakness 2"],
  "recommendations": ["Recommendation 1", "Recommendation 2"]
}"#;

pub const DETAILED_SCHEMA_EXAMPLE: &str = r#"{
  "score": 85,
  "summary": "A short summary of how well the resume matches the job description",
  "detailed_analysis": {
    "qualification_match": {
      "score": 90,
      "comments": ["How education, certifications and years of experience meet the stated requirements"]
    },
    "skill_match": {
      "score": 80,
      "comments": ["Which required and preferred skills are covered or missing"]
    },
    "experience_quality": {
      "score": 85,
      "comments": ["Relevance, depth and measurable results of past roles and projects"]
    },
    "potential": {
      "score": 80,
      "comments": ["Learning ability, growth trajectory and fit for the role's future needs"]
    }
  },
  "strengths": ["Strength 1", "Strength 2"],
  "weaknesses": ["Weakness 1", "Weakness 2"],
  "recommendations": ["Recommendation 1", "Recommendation 2"],
  "hr_interview_focus": ["Topic to probe in the interview 1", "Topic to probe in the interview 2"]
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

/// Score and reviewer comments for one evaluation dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8, // 0 – 100
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub comments: Vec<String>,
}

/// Per-dimension breakdown, detailed variant only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification_match: Option<DimensionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_match: Option<DimensionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_quality: Option<DimensionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential: Option<DimensionScore>,
}

/// The structured evaluation written to stdout.
///
/// Empty lists and absent optional sections are left out of the JSON, so any list that
/// appears is non-empty. `raw_response` is never read from model output; it is only set on
/// the diagnostic result produced when the model's text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8, // 0 – 100
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub strengths: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub weaknesses: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recommendations: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub hr_interview_focus: Vec<String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl EvaluationResult {
    /// True when this is the synthetic result built from an unparseable model response.
    pub fn is_diagnostic(&self) -> bool {
        self.raw_response.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field decoding
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreRepr {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts `85`, `85.4`, `"85"`, `"85%"` and `"85/100"`; rounds and clamps into 0..=100.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match ScoreRepr::deserialize(deserializer)? {
        ScoreRepr::Int(n) => n as f64,
        ScoreRepr::Float(f) => f,
        ScoreRepr::Text(s) => {
            let number = s.split('/').next().unwrap_or_default();
            let number = number.trim().trim_end_matches('%').trim();
            number
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("score is not numeric: {s:?}")))?
        }
    };

    if !value.is_finite() {
        return Err(D::Error::custom("score is not a finite number"));
    }

    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Accepts a list (non-string items are stringified) or a single string; drops blank items.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a list of strings, got {other}"
            )))
        }
    };

    Ok(items.into_iter().filter(|s| !s.trim().is_empty()).collect())
}
