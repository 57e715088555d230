//! Prompt construction
//!
//! All prompts are minijinja templates compiled into the binary. The
//! engine fills them with the schema documentation, sampled examples
//! and the user's question; nothing about prompt wording leaks into the
//! rest of the pipeline.

use crate::examples::Example;
use crate::model::LlmError;
use minijinja::{context, Environment};
use serde::Serialize;
use tabletalk_core::{SchemaDoc, SqlType};

/// The exact line the model must emit when a question cannot be
/// answered from the documented schema. The pipeline matches on it.
pub const REFUSAL_SENTENCE: &str =
    "Error: The question cannot be answered with the available schema.";

const SQL_TEMPLATE: &str = "\
You are a PostgreSQL expert who turns business questions into SQL queries
against the documented schema below.

Core Directives:
1. Return raw SQL only: no markdown fences, no commentary, no explanation.
2. Use only tables and columns that appear in the schema documentation.
3. If the question cannot be answered with the documented schema, return
exactly this line and nothing else:
Error: The question cannot be answered with the available schema.
4. The query must be valid PostgreSQL.

SQL Construction Rules:
- Every non-aggregated SELECT column must appear in GROUP BY.
- Filter on aggregated values with HAVING, not WHERE.
- To rank or window over aggregated values, aggregate in a CTE first.
- Never invent filter values the question does not state.
- Do not add running or cumulative totals unless the question asks for them.
- Use short table aliases.
{% if schema.business_notes %}
Business Context:
{% for note in schema.business_notes %}- {{ note }}
{% endfor %}{% endif %}
Schema Documentation:
{{ schema.rendered }}
{% if examples %}
Examples:
{% for example in examples %}Question: {{ example.question }}
SQL: {{ example.sql }}

{% endfor %}{% endif %}
{% if refinement %}
Your previous query was rejected.
Previous SQL: {{ refinement.previous_sql }}
Feedback: {{ refinement.feedback }}
Return a corrected query that resolves the feedback.
{% endif %}
Question: {{ question }}
SQL:";

const REPAIR_TEMPLATE: &str = "\
You are a PostgreSQL expert fixing a query that the database rejected.

Question: {{ question }}

Failed SQL:
{{ failed_sql }}

Database error:
{{ error }}

Schema Documentation:
{{ schema.rendered }}

Return only the corrected SQL statement: no markdown fences, no commentary.
If the question cannot be answered with the documented schema, return
exactly this line and nothing else:
Error: The question cannot be answered with the available schema.
SQL:";

const ANALYSIS_TEMPLATE: &str = "\
You are a data analyst answering a business question from query results.

Question: {{ question }}

SQL:
{{ sql }}

Results:
{{ results }}

{% if single_value %}
The result is a single value. State it plainly in one sentence that
answers the question. Do not speculate beyond the value.
{% else %}
Summarize what the results show in two to four sentences. Call out the
notable highs and lows. Do not invent causes the data does not show.
{% endif %}
Respond with the analysis text only.";

/// What the schema documentation looks like from inside a prompt.
///
/// `rendered` is embedded verbatim; `business_notes` is the derived
/// one-liner summary of join paths and column roles that precedes it.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaContext {
    pub rendered: String,
    pub business_notes: Vec<String>,
}

impl SchemaContext {
    /// Bare context with no derived notes.
    pub fn new(rendered: impl Into<String>) -> Self {
        Self {
            rendered: rendered.into(),
            business_notes: Vec::new(),
        }
    }

    /// Derive the business notes from the schema document: one line per
    /// join hint, then the dimension and metric columns of each table.
    pub fn from_doc(doc: &SchemaDoc, rendered: impl Into<String>) -> Self {
        let mut notes = Vec::new();

        for hint in &doc.join_hints {
            notes.push(format!(
                "Join {} to {} on {}.{} = {}.{}",
                hint.left.table,
                hint.right.table,
                hint.left.table,
                hint.left.column,
                hint.right.table,
                hint.right.column,
            ));
        }

        for table in &doc.tables {
            let dimensions = column_names(table, |t| !is_metric(t));
            if !dimensions.is_empty() {
                notes.push(format!(
                    "Dimension columns in {} (group and filter by these): {}",
                    table.name,
                    dimensions.join(", ")
                ));
            }
            let metrics = column_names(table, is_metric);
            if !metrics.is_empty() {
                notes.push(format!(
                    "Metric columns in {} (aggregate these): {}",
                    table.name,
                    metrics.join(", ")
                ));
            }
        }

        Self {
            rendered: rendered.into(),
            business_notes: notes,
        }
    }
}

fn is_metric(sql_type: SqlType) -> bool {
    matches!(
        sql_type,
        SqlType::Integer | SqlType::BigInt | SqlType::Real
    )
}

fn column_names(table: &tabletalk_core::Table, keep: impl Fn(SqlType) -> bool) -> Vec<&str> {
    table
        .columns
        .iter()
        .filter(|c| keep(c.sql_type))
        .map(|c| c.name.as_str())
        .collect()
}

/// A rejected attempt fed back into the next generation prompt.
#[derive(Debug, Clone, Serialize)]
pub struct Refinement {
    pub previous_sql: String,
    pub feedback: String,
}

impl Refinement {
    pub fn new(previous_sql: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            previous_sql: previous_sql.into(),
            feedback: feedback.into(),
        }
    }
}

/// Shape of a query result, for picking analysis instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Exactly one row with one column
    SingleValue,
    /// Anything else
    Table,
}

impl ResultShape {
    pub fn from_counts(rows: usize, columns: usize) -> Self {
        if rows == 1 && columns == 1 {
            Self::SingleValue
        } else {
            Self::Table
        }
    }
}

/// Renders the generation, repair and analysis prompts.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("sql", SQL_TEMPLATE)
            .expect("sql template compiles");
        env.add_template("repair", REPAIR_TEMPLATE)
            .expect("repair template compiles");
        env.add_template("analysis", ANALYSIS_TEMPLATE)
            .expect("analysis template compiles");
        Self { env }
    }

    /// The master generation prompt.
    pub fn sql_prompt(
        &self,
        question: &str,
        schema: &SchemaContext,
        examples: &[&Example],
        refinement: Option<&Refinement>,
    ) -> Result<String, LlmError> {
        self.render(
            "sql",
            context! { question, schema, examples, refinement },
        )
    }

    /// Retry prompt embedding the SQL the database rejected and its
    /// error message.
    pub fn repair_prompt(
        &self,
        question: &str,
        schema: &SchemaContext,
        failed_sql: &str,
        error: &str,
    ) -> Result<String, LlmError> {
        self.render(
            "repair",
            context! { question, schema, failed_sql, error },
        )
    }

    /// Result analysis prompt. The instructions differ for a single
    /// value and a multi-row table.
    pub fn analysis_prompt(
        &self,
        question: &str,
        sql: &str,
        results: &str,
        shape: ResultShape,
    ) -> Result<String, LlmError> {
        self.render(
            "analysis",
            context! {
                question,
                sql,
                results,
                single_value => shape == ResultShape::SingleValue,
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, LlmError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| LlmError::TemplateError(e.to_string()))?;
        template
            .render(ctx)
            .map_err(|e| LlmError::TemplateError(e.to_string()))
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
