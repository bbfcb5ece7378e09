// Quotation pipeline: schema, typed model, normalization, attachment staging, generation.
// All LLM calls go through llm_client; nothing here talks to the provider directly.

pub mod attachment;
pub mod generator;
pub mod handlers;
pub mod model;
pub mod normalizer;
pub mod prompts;
pub mod schema;
