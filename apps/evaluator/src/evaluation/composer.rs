//! Prompt Composer: builds the model prompt for one (JD, resume) pair.

use std::fmt;

use crate::evaluation::prompts::{
    BASIC_TASK_SECTION, CLOSING_INSTRUCTION, DETAILED_TASK_SECTION, JD_HEADING, OUTPUT_SECTION,
    RESUME_HEADING, ROLE_SECTION, SCORE_RULES,
};
use crate::evaluation::schema::SchemaVariant;
use crate::extraction::ExtractedText;

/// A fully rendered prompt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the evaluation prompt.
///
/// Both documents are embedded verbatim (no truncation) by plain concatenation, so
/// document text can never be mistaken for a template placeholder. Pure and deterministic.
pub fn compose(jd: &ExtractedText, resume: &ExtractedText, variant: SchemaVariant) -> Prompt {
    let task = match variant {
        SchemaVariant::Basic => BASIC_TASK_SECTION,
        SchemaVariant::Detailed => DETAILED_TASK_SECTION,
    };

    let mut prompt = String::with_capacity(
        jd.text.len() + resume.text.len() + variant.schema_example().len() + 2048,
    );
    push_block(&mut prompt, ROLE_SECTION);
    push_block(&mut prompt, task);
    push_block(&mut prompt, JD_HEADING);
    prompt.push('\n');
    prompt.push_str(&jd.text);
    push_block(&mut prompt, RESUME_HEADING);
    prompt.push('\n');
    prompt.push_str(&resume.text);
    push_block(&mut prompt, OUTPUT_SECTION);
    push_block(&mut prompt, variant.schema_example());
    push_block(&mut prompt, SCORE_RULES);
    prompt.push('\n');
    prompt.push_str(CLOSING_INSTRUCTION);

    Prompt(prompt)
}

/// Appends `block`, separated from what came before by a blank line.
fn push_block(prompt: &mut String, block: &str) {
    if !prompt.is_empty() {
        prompt.push_str("\n\n");
    }
    prompt.push_str(block);
}
