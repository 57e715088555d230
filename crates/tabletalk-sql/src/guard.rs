//! Read-only statement guard
//!
//! Everything the pipeline executes goes through here first. The guard
//! parses candidate SQL and rejects anything that is not exactly one
//! `SELECT` (or `WITH ... SELECT`) statement. Writes never reach the
//! database no matter what the model produced.

use sqlparser::ast::{Query, Statement};
use sqlparser::dialect::{Dialect, GenericDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use tabletalk_core::{Diagnostic, DiagnosticCode, Severity};
use thiserror::Error;

/// SQL guard with configurable dialect
pub struct SqlGuard {
    dialect: Box<dyn Dialect>,
}

impl SqlGuard {
    /// Create a guard using the generic dialect.
    ///
    /// Generic is deliberately permissive: model output often mixes
    /// dialects, and the fixup pass needs to see the statement before
    /// judging it. Dialect strictness is the database's job at EXPLAIN
    /// time, not the parser's.
    pub fn new() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a guard using the PostgreSQL dialect.
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    /// Parse candidate SQL and admit it only if it is a single read-only
    /// statement.
    pub fn check(&self, sql: &str) -> Result<ParsedQuery, SqlGuardError> {
        if sql.trim().is_empty() {
            return Err(SqlGuardError::Empty);
        }

        let mut statements = Parser::parse_sql(&*self.dialect, sql)
            .map_err(|e| SqlGuardError::ParseError(e.to_string()))?;

        match statements.len() {
            0 => Err(SqlGuardError::Empty),
            1 => match statements.remove(0) {
                Statement::Query(query) => Ok(ParsedQuery {
                    sql: sql.to_string(),
                    query: *query,
                }),
                other => Err(SqlGuardError::NotReadOnly(statement_kind(&other))),
            },
            n => Err(SqlGuardError::MultipleStatements(n)),
        }
    }
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// A statement that passed the guard
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// The SQL text as it was admitted
    pub sql: String,
    /// The parsed query AST
    pub query: Query,
}

impl ParsedQuery {
    /// Re-render the (possibly rewritten) AST back to SQL.
    pub fn render(&self) -> String {
        self.query.to_string()
    }
}

/// Why the guard rejected a candidate statement
#[derive(Debug, Error)]
pub enum SqlGuardError {
    #[error("Failed to parse SQL: {0}")]
    ParseError(String),

    #[error("Statement is not read-only: found {0}")]
    NotReadOnly(&'static str),

    #[error("Expected a single statement, found {0}")]
    MultipleStatements(usize),

    #[error("No SQL statement found")]
    Empty,
}

impl SqlGuardError {
    /// Convert the rejection to a diagnostic for reports.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            SqlGuardError::ParseError(_) | SqlGuardError::Empty => DiagnosticCode::SqlParseError,
            SqlGuardError::NotReadOnly(_) => DiagnosticCode::SqlNotReadOnly,
            SqlGuardError::MultipleStatements(_) => DiagnosticCode::SqlMultipleStatements,
        };
        Diagnostic::new(code, Severity::Error, self.to_string())
    }

    /// True when the model produced something structurally broken that a
    /// repair prompt may be able to fix, as opposed to a policy
    /// violation.
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            SqlGuardError::ParseError(_) | SqlGuardError::MultipleStatements(_)
        )
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert { .. } => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete { .. } => "DELETE",
        Statement::Drop { .. } => "DROP",
        Statement::Truncate { .. } => "TRUNCATE",
        Statement::CreateTable { .. } => "CREATE TABLE",
        Statement::CreateView { .. } => "CREATE VIEW",
        Statement::CreateIndex { .. } => "CREATE INDEX",
        Statement::AlterTable { .. } => "ALTER TABLE",
        Statement::Grant { .. } => "GRANT",
        Statement::Revoke { .. } => "REVOKE",
        Statement::Merge { .. } => "MERGE",
        Statement::Copy { .. } => "COPY",
        Statement::Call { .. } => "CALL",
        Statement::Execute { .. } => "EXECUTE",
        Statement::SetVariable { .. } => "SET",
        _ => "a non-query statement",
    }
}
