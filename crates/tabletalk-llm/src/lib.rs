//! TableTalk LLM - model client, few-shot examples, and prompts
//!
//! Everything that touches the language model lives here: the
//! [`LanguageModel`] trait, the [`OllamaClient`] implementation, the
//! [`ScriptedModel`] test double, the [`ExampleSet`] few-shot corpus that
//! grows through the feedback loop, and the [`PromptBuilder`] holding the
//! generation, repair, and analysis templates.

pub mod examples;
pub mod model;
pub mod ollama;
pub mod prompt;
pub mod scripted;

pub use examples::{Example, ExampleError, ExampleSet};
pub use model::{LanguageModel, LlmError};
pub use ollama::OllamaClient;
pub use prompt::{PromptBuilder, Refinement, ResultShape, SchemaContext, REFUSAL_SENTENCE};
pub use scripted::ScriptedModel;
