//! The ask pipeline
//!
//! One `Pipeline` owns the parsed schema documentation plus injected
//! model and database handles, and drives a question through
//! generation, cleanup, grounding, vetting, execution, and analysis.
//! SQL reaches `run_query` only after `EXPLAIN` accepted it.

use crate::error::PipelineError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabletalk_catalog::{DatabaseAdapter, ExplainOutcome, QueryRows};
use tabletalk_core::{Config, SchemaDoc};
use tabletalk_doc::render_prompt_context;
use tabletalk_llm::{
    Example, ExampleSet, LanguageModel, PromptBuilder, Refinement, ResultShape, SchemaContext,
};
use tabletalk_sql::{
    extract_sql, normalize_identifier_quoting, rewrite_for_postgres, GroundingCheck, SqlGuard,
};

/// Analysis text used when a vetted query returns no rows. The model is
/// not consulted for an empty result.
pub const EMPTY_RESULT_ANALYSIS: &str =
    "The query returned no results. There is nothing to analyze.";

/// A question for the pipeline, optionally refining an earlier answer.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,

    /// SQL from a previous round the user was not happy with.
    pub previous_sql: Option<String>,

    /// What the user said was wrong with it. Takes effect together
    /// with `previous_sql`.
    pub feedback: Option<String>,
}

impl AskRequest {
    pub fn question(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            previous_sql: None,
            feedback: None,
        }
    }

    pub fn with_refinement(
        mut self,
        previous_sql: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        self.previous_sql = Some(previous_sql.into());
        self.feedback = Some(feedback.into());
        self
    }
}

/// Vetted SQL plus how many model calls it took to get there.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub attempts: u32,
}

/// Everything the pipeline produced for one question.
///
/// `rows` and `analysis` are `None` when execution is disabled.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub sql: String,
    pub rows: Option<QueryRows>,
    pub analysis: Option<String>,
    pub attempts: u32,
}

/// Why an attempt was thrown away, and what to tell the model next.
enum AttemptFailure {
    /// The response held nothing that starts like a query.
    NoSql { raw: String },

    /// Extracted SQL failed the guard or referenced undocumented schema.
    Rejected { sql: String, reason: String },

    /// PostgreSQL itself rejected the statement under `EXPLAIN`.
    ExplainRejected { sql: String, error: String },
}

impl AttemptFailure {
    fn reason(&self) -> &str {
        match self {
            Self::NoSql { .. } => "no SQL statement in the response",
            Self::Rejected { reason, .. } => reason,
            Self::ExplainRejected { error, .. } => error,
        }
    }
}

/// The question-to-answer pipeline.
pub struct Pipeline {
    doc: SchemaDoc,
    model: Arc<dyn LanguageModel>,
    adapter: Arc<dyn DatabaseAdapter>,
    prompts: PromptBuilder,
    guard: SqlGuard,
    examples: ExampleSet,
    examples_path: PathBuf,
    sample_size: usize,
    max_syntax_retries: u32,
    execute: bool,
}

impl Pipeline {
    pub fn new(
        doc: SchemaDoc,
        model: Arc<dyn LanguageModel>,
        adapter: Arc<dyn DatabaseAdapter>,
    ) -> Self {
        Self {
            doc,
            model,
            adapter,
            prompts: PromptBuilder::new(),
            guard: SqlGuard::postgres(),
            examples: ExampleSet::new(),
            examples_path: PathBuf::from("examples.txt"),
            sample_size: 3,
            max_syntax_retries: 2,
            execute: true,
        }
    }

    /// Apply the example and pipeline sections of the configuration.
    pub fn from_config(
        doc: SchemaDoc,
        model: Arc<dyn LanguageModel>,
        adapter: Arc<dyn DatabaseAdapter>,
        config: &Config,
    ) -> Self {
        Self::new(doc, model, adapter)
            .with_examples_path(&config.examples.path)
            .with_sample_size(config.examples.sample_size)
            .with_max_syntax_retries(config.pipeline.max_syntax_retries)
            .with_execution(config.pipeline.execute)
    }

    /// Replace the in-memory example corpus.
    pub fn with_examples(mut self, examples: ExampleSet) -> Self {
        self.examples = examples;
        self
    }

    /// Where `record_good_example` appends confirmed pairs.
    pub fn with_examples_path(mut self, path: impl AsRef<Path>) -> Self {
        self.examples_path = path.as_ref().to_path_buf();
        self
    }

    /// How many examples each prompt samples from the corpus.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// How many times a rejected query may be regenerated.
    pub fn with_max_syntax_retries(mut self, retries: u32) -> Self {
        self.max_syntax_retries = retries;
        self
    }

    /// Whether `ask` runs the vetted query and analyzes the result.
    pub fn with_execution(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }

    /// Verify the model server and the database are reachable.
    pub async fn health_check(&self) -> Result<(), PipelineError> {
        self.model.health_check().await?;
        self.adapter.test_connection().await?;
        Ok(())
    }

    /// Generate SQL for the question, retrying until it passes the
    /// guard, the grounding check, and an `EXPLAIN` round trip.
    pub async fn generate_sql(&self, req: &AskRequest) -> Result<GeneratedSql, PipelineError> {
        let schema = self.prompt_context();
        let sampled = self.examples.sample(self.sample_size);
        let grounding = GroundingCheck::new(&self.doc);

        let user_refinement = match (&req.previous_sql, &req.feedback) {
            (Some(sql), Some(feedback)) => Some(Refinement::new(sql.as_str(), feedback.as_str())),
            _ => None,
        };

        let total = self.max_syntax_retries.saturating_add(1);
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=total {
            let prompt = self.build_prompt(
                &req.question,
                &schema,
                &sampled,
                user_refinement.as_ref(),
                last_failure.as_ref(),
            )?;
            tracing::info!(
                attempt,
                total,
                prompt_chars = prompt.len(),
                model = self.model.model(),
                "Requesting SQL generation"
            );

            let raw = self.model.generate(&prompt).await?;

            let trimmed = raw.trim();
            if trimmed.starts_with("Error:") {
                tracing::info!(attempt, "Model declined the question");
                return Err(PipelineError::Refused {
                    message: trimmed.to_string(),
                });
            }

            let Some(candidate) = extract_sql(&raw) else {
                tracing::warn!(attempt, "No SQL statement in the model response");
                last_failure = Some(AttemptFailure::NoSql { raw });
                continue;
            };

            let normalized = normalize_identifier_quoting(&candidate);
            let mut parsed = match self.guard.check(&normalized) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Guard rejected the SQL");
                    last_failure = Some(AttemptFailure::Rejected {
                        sql: candidate,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            rewrite_for_postgres(&mut parsed);

            let diagnostics = grounding.check(&parsed.query);
            if !diagnostics.is_empty() {
                let reason = diagnostics
                    .iter()
                    .map(|d| d.message.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                tracing::warn!(attempt, %reason, "SQL references undocumented schema");
                last_failure = Some(AttemptFailure::Rejected {
                    sql: parsed.sql,
                    reason,
                });
                continue;
            }

            match self.adapter.explain(&parsed.sql).await? {
                ExplainOutcome::Valid { plan } => {
                    tracing::info!(attempt, plan_lines = plan.len(), "EXPLAIN accepted the query");
                    return Ok(GeneratedSql {
                        sql: parsed.sql,
                        attempts: attempt,
                    });
                }
                ExplainOutcome::Invalid { error } => {
                    tracing::warn!(attempt, %error, "EXPLAIN rejected the query");
                    last_failure = Some(AttemptFailure::ExplainRejected {
                        sql: parsed.sql,
                        error,
                    });
                }
            }
        }

        match last_failure {
            Some(AttemptFailure::NoSql { raw }) => Err(PipelineError::NoSqlFound { raw }),
            Some(failure) => Err(PipelineError::RetriesExhausted {
                attempts: total,
                last_error: failure.reason().to_string(),
            }),
            None => Err(PipelineError::RetriesExhausted {
                attempts: 0,
                last_error: "the retry budget allows no attempts".to_string(),
            }),
        }
    }

    /// Full round trip: generate, execute when enabled, analyze.
    pub async fn ask(&self, req: &AskRequest) -> Result<AskOutcome, PipelineError> {
        let generated = self.generate_sql(req).await?;

        if !self.execute {
            return Ok(AskOutcome {
                sql: generated.sql,
                rows: None,
                analysis: None,
                attempts: generated.attempts,
            });
        }

        let rows = self.adapter.run_query(&generated.sql).await?;
        tracing::info!(rows = rows.row_count(), "Query executed");
        let analysis = self.analyze(&req.question, &generated.sql, &rows).await?;

        Ok(AskOutcome {
            sql: generated.sql,
            rows: Some(rows),
            analysis: Some(analysis),
            attempts: generated.attempts,
        })
    }

    /// Narrate a query result in plain language.
    pub async fn analyze(
        &self,
        question: &str,
        sql: &str,
        rows: &QueryRows,
    ) -> Result<String, PipelineError> {
        if rows.is_empty() {
            return Ok(EMPTY_RESULT_ANALYSIS.to_string());
        }

        let shape = ResultShape::from_counts(rows.row_count(), rows.columns.len());
        let prompt = self
            .prompts
            .analysis_prompt(question, sql, &rows.to_markdown(), shape)?;
        let analysis = self.model.generate(&prompt).await?;
        Ok(analysis.trim().to_string())
    }

    /// Good-feedback path: persist a confirmed question/SQL pair so
    /// future prompts can sample it.
    pub fn record_good_example(&self, question: &str, sql: &str) -> Result<(), PipelineError> {
        let example = Example::new(question, sql);
        ExampleSet::append_to_file(&example, &self.examples_path)?;
        tracing::info!(path = %self.examples_path.display(), "Recorded good example");
        Ok(())
    }

    fn prompt_context(&self) -> SchemaContext {
        SchemaContext::from_doc(&self.doc, render_prompt_context(&self.doc))
    }

    /// Pick the prompt for this attempt: the plain generation prompt,
    /// its refinement variant after an in-pipeline rejection, or the
    /// repair variant after the database itself said no.
    fn build_prompt(
        &self,
        question: &str,
        schema: &SchemaContext,
        sampled: &[&Example],
        user_refinement: Option<&Refinement>,
        last_failure: Option<&AttemptFailure>,
    ) -> Result<String, PipelineError> {
        let prompt = match last_failure {
            None => self
                .prompts
                .sql_prompt(question, schema, sampled, user_refinement)?,
            Some(AttemptFailure::ExplainRejected { sql, error }) => {
                self.prompts.repair_prompt(question, schema, sql, error)?
            }
            Some(AttemptFailure::NoSql { raw }) => {
                let refinement = Refinement::new(
                    raw.trim(),
                    "The response did not contain a SQL statement. Return one SQL query and nothing else.",
                );
                self.prompts
                    .sql_prompt(question, schema, sampled, Some(&refinement))?
            }
            Some(AttemptFailure::Rejected { sql, reason }) => {
                let refinement = Refinement::new(sql.as_str(), reason.as_str());
                self.prompts
                    .sql_prompt(question, schema, sampled, Some(&refinement))?
            }
        };
        Ok(prompt)
    }
}
