//! Database adapter trait for introspection and guarded execution

use crate::live::{LiveSchema, QueryRows};

/// Errors that can occur when talking to a database
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to the database: {0}")]
    ConnectionError(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Schema '{0}' contains no tables")]
    EmptySchema(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result of vetting a statement with EXPLAIN
///
/// An invalid statement is a normal outcome, not an adapter failure: the
/// database's own error message is exactly what the repair prompt needs.
/// `Err` from [`DatabaseAdapter::explain`] is reserved for transport
/// problems that no amount of SQL repair will fix.
#[derive(Debug, Clone)]
pub enum ExplainOutcome {
    /// The planner accepted the statement
    Valid {
        /// Plan lines as returned by the database
        plan: Vec<String>,
    },

    /// The database rejected the statement
    Invalid {
        /// The database's error message, verbatim
        error: String,
    },
}

impl ExplainOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ExplainOutcome::Valid { .. })
    }
}

/// Trait for databases the pipeline can introspect and query
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the adapter name (e.g., "PostgreSQL", "Mock")
    fn name(&self) -> &'static str;

    /// Fetch the live schema for a namespace from the database's
    /// information_schema.
    async fn fetch_live_schema(&self, schema_name: &str) -> Result<LiveSchema, DatabaseError>;

    /// Vet a statement by asking the database to plan it without running
    /// it.
    async fn explain(&self, sql: &str) -> Result<ExplainOutcome, DatabaseError>;

    /// Execute a read-only statement and return its rows as text.
    ///
    /// Callers are responsible for admitting only read-only SQL; the
    /// adapter does not re-check.
    async fn run_query(&self, sql: &str) -> Result<QueryRows, DatabaseError>;

    /// Test the connection before starting a session.
    async fn test_connection(&self) -> Result<(), DatabaseError>;
}
