// Cover letter generation: prompt construction and the single completion call.
// All LLM traffic goes through llm_client.

pub mod generator;
pub mod prompts;

pub use generator::{generate_cover_letter, GenerationRequest};
