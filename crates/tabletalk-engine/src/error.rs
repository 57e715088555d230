//! Pipeline errors

use tabletalk_catalog::DatabaseError;
use tabletalk_llm::{ExampleError, LlmError};
use tabletalk_sql::SqlGuardError;
use thiserror::Error;

/// Everything that can stop the pipeline from answering a question.
///
/// Retryable problems (bad SQL, grounding failures, `EXPLAIN`
/// rejections) are consumed inside the attempt loop; what surfaces here
/// is either a terminal outcome or an infrastructure failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The model declined because the documented schema cannot answer
    /// the question. `message` is the model's refusal line.
    #[error("{message}")]
    Refused { message: String },

    /// No attempt produced anything that looked like SQL.
    #[error("The model response contained no SQL statement")]
    NoSqlFound { raw: String },

    /// Every attempt produced SQL that was rejected.
    #[error("No valid SQL after {attempts} attempts. Last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Guard(#[from] SqlGuardError),

    #[error(transparent)]
    Examples(#[from] ExampleError),
}
