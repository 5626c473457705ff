// Resume evaluation: prompt composition, response normalization, fallback results and
// the orchestrator tying them to extraction and the model client.

pub mod composer;
pub mod defaults;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod schema;
