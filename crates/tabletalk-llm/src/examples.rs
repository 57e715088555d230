//! Few-shot example corpus
//!
//! The corpus lives in a plain-text file of blocks separated by `###`
//! lines. Each block holds a natural-language question, a `---` line,
//! and the SQL answer:
//!
//! ```text
//! ###
//! What was the total revenue per category?
//! ---
//! SELECT c.category, SUM(o.sales_revenue) AS revenue
//! FROM ssa_order_data AS o
//! JOIN ssa_category_data AS c ON o.sku_code = c.sku_code
//! GROUP BY c.category;
//! ```
//!
//! Confirmed question/SQL pairs can be appended, so the corpus grows as
//! the assistant is used.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors when reading or writing the examples file.
#[derive(Debug, Error)]
pub enum ExampleError {
    #[error("Failed to read examples from {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to write examples to {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },
}

/// One worked question/SQL pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub sql: String,
}

impl Example {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }

    /// Render the pair the way prompts embed it.
    pub fn render(&self) -> String {
        format!("Question: {}\nSQL: {}", self.question, self.sql)
    }

    fn render_block(&self) -> String {
        format!("###\n{}\n---\n{}\n", self.question, self.sql)
    }
}

/// An in-memory example corpus.
///
/// Malformed blocks are dropped during parsing rather than failing the
/// whole file; `skipped()` reports how many were dropped.
#[derive(Debug, Clone, Default)]
pub struct ExampleSet {
    examples: Vec<Example>,
    skipped: usize,
}

impl ExampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_examples(examples: Vec<Example>) -> Self {
        Self {
            examples,
            skipped: 0,
        }
    }

    /// Parse the block format.
    ///
    /// A block is valid when it contains a `---` separator with
    /// non-empty text on both sides. Anything else is counted and
    /// skipped with a warning, so one bad edit never poisons the
    /// whole corpus.
    pub fn parse_str(source: &str) -> Self {
        let mut blocks: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in source.lines() {
            if line.trim_start().starts_with("###") {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                // Text after the marker starts the new block's question.
                let rest = line.trim_start().trim_start_matches('#').trim();
                if !rest.is_empty() {
                    current.push(rest);
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        let mut examples = Vec::new();
        let mut skipped = 0;

        for block in blocks {
            if block.iter().all(|line| line.trim().is_empty()) {
                continue;
            }
            match parse_block(&block) {
                Some(example) => examples.push(example),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped malformed example blocks");
        }

        Self { examples, skipped }
    }

    /// Load and parse the corpus file.
    pub fn load(path: &Path) -> Result<Self, ExampleError> {
        let source = std::fs::read_to_string(path).map_err(|e| ExampleError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse_str(&source))
    }

    /// Write the corpus back out in the block format.
    pub fn save(&self, path: &Path) -> Result<(), ExampleError> {
        let mut out = String::new();
        for example in &self.examples {
            out.push_str(&example.render_block());
        }
        std::fs::write(path, out).map_err(|e| ExampleError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Append one example to the corpus file without rewriting it.
    ///
    /// Creates the file if it does not exist yet.
    pub fn append_to_file(example: &Example, path: &Path) -> Result<(), ExampleError> {
        let write_error = |e: std::io::Error| ExampleError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(write_error)?;
        file.write_all(example.render_block().as_bytes())
            .map_err(write_error)
    }

    pub fn push(&mut self, example: Example) {
        self.examples.push(example);
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Number of malformed blocks dropped by the last parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Sample up to `n` examples without replacement.
    ///
    /// When the corpus holds `n` or fewer examples, all of them are
    /// returned in corpus order.
    pub fn sample(&self, n: usize) -> Vec<&Example> {
        self.sample_with_rng(&mut rand::thread_rng(), n)
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<&Example> {
        if self.examples.len() <= n {
            return self.examples.iter().collect();
        }
        self.examples.choose_multiple(rng, n).collect()
    }
}

fn parse_block(lines: &[&str]) -> Option<Example> {
    let separator = lines.iter().position(|line| line.trim() == "---")?;
    let question = lines[..separator].join("\n").trim().to_string();
    let sql = lines[separator + 1..].join("\n").trim().to_string();
    if question.is_empty() || sql.is_empty() {
        return None;
    }
    Some(Example { question, sql })
}
