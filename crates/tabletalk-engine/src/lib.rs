//! TableTalk engine - the question-to-answer pipeline
//!
//! Ties the other crates together: render the schema documentation into
//! a prompt context, sample few-shot examples, ask the model for SQL,
//! clean and rewrite what comes back, ground it against the
//! documentation, vet it with `EXPLAIN`, execute it, and narrate the
//! result. Model and database are injected behind traits so the whole
//! flow runs against test doubles.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{
    AskOutcome, AskRequest, GeneratedSql, Pipeline, EMPTY_RESULT_ANALYSIS,
};
