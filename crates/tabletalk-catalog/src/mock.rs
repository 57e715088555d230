//! Mock database adapter for testing
//!
//! Returns predefined schemas and query results without a real database.
//! Useful for:
//! - Unit testing the pipeline's retry and repair logic
//! - Integration tests in CI where no PostgreSQL is available
//! - Demos without real credentials
//!
//! ## Usage
//!
//! ```rust,ignore
//! let adapter = MockAdapter::with_schema(schema);
//! adapter.respond_with("SUM(sales_revenue)", QueryRows::single("total", "1250.00")).await;
//! adapter.fail_explain_when("customer_master", "relation \"customer_master\" does not exist").await;
//! ```

use crate::adapter::{DatabaseAdapter, DatabaseError, ExplainOutcome};
use crate::live::{LiveSchema, QueryRows};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock database adapter
///
/// Query results and EXPLAIN failures are matched by substring, which
/// keeps tests readable: script the fragment of SQL you care about, not
/// the exact rendering.
pub struct MockAdapter {
    /// Schema returned by fetch_live_schema
    schema: Arc<RwLock<LiveSchema>>,

    /// Scripted query results: first matching substring wins
    results: Arc<RwLock<Vec<(String, QueryRows)>>>,

    /// Scripted EXPLAIN rejections: substring to database error message
    explain_failures: Arc<RwLock<Vec<(String, String)>>>,

    /// Log of every call, for assertions
    calls: Arc<RwLock<Vec<String>>>,

    /// Simulate connection failure on every operation
    fail_connection: bool,
}

impl MockAdapter {
    /// Create a mock with an empty "public" schema.
    pub fn new() -> Self {
        Self::with_schema(LiveSchema::new("public"))
    }

    /// Create a mock that reports the given live schema.
    pub fn with_schema(schema: LiveSchema) -> Self {
        Self {
            schema: Arc::new(RwLock::new(schema)),
            results: Arc::new(RwLock::new(Vec::new())),
            explain_failures: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            fail_connection: false,
        }
    }

    /// Configure every operation to fail as if the database were down.
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Script a query result for statements containing `needle`.
    pub async fn respond_with(&self, needle: impl Into<String>, rows: QueryRows) {
        self.results.write().await.push((needle.into(), rows));
    }

    /// Script an EXPLAIN rejection for statements containing `needle`.
    pub async fn fail_explain_when(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.explain_failures
            .write()
            .await
            .push((needle.into(), message.into()));
    }

    /// Every call made so far, in order, as "operation sql" strings.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.write().await.push(call);
    }

    fn down() -> DatabaseError {
        DatabaseError::ConnectionError("mock connection failure".to_string())
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DatabaseAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_live_schema(&self, schema_name: &str) -> Result<LiveSchema, DatabaseError> {
        self.record(format!("fetch_live_schema {schema_name}")).await;
        if self.fail_connection {
            return Err(Self::down());
        }
        Ok(self.schema.read().await.clone())
    }

    async fn explain(&self, sql: &str) -> Result<ExplainOutcome, DatabaseError> {
        self.record(format!("explain {sql}")).await;
        if self.fail_connection {
            return Err(Self::down());
        }
        for (needle, message) in self.explain_failures.read().await.iter() {
            if sql.contains(needle.as_str()) {
                return Ok(ExplainOutcome::Invalid {
                    error: message.clone(),
                });
            }
        }
        Ok(ExplainOutcome::Valid {
            plan: vec!["Seq Scan  (cost=0.00..1.00 rows=1 width=4)".to_string()],
        })
    }

    async fn run_query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        self.record(format!("run_query {sql}")).await;
        if self.fail_connection {
            return Err(Self::down());
        }
        for (needle, rows) in self.results.read().await.iter() {
            if sql.contains(needle.as_str()) {
                return Ok(rows.clone());
            }
        }
        Ok(QueryRows::empty())
    }

    async fn test_connection(&self) -> Result<(), DatabaseError> {
        self.record("test_connection".to_string()).await;
        if self.fail_connection {
            return Err(Self::down());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_result_matches_by_substring() {
        let adapter = MockAdapter::new();
        adapter
            .respond_with("SUM(sales_revenue)", QueryRows::single("total", "1250.00"))
            .await;

        let rows = adapter
            .run_query("SELECT SUM(sales_revenue) AS total FROM ssa_order_data")
            .await
            .unwrap();
        assert_eq!(rows.single_value(), Some("1250.00"));

        let other = adapter.run_query("SELECT 1").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_explain_failure() {
        let adapter = MockAdapter::new();
        adapter
            .fail_explain_when("customer_master", "relation \"customer_master\" does not exist")
            .await;

        let outcome = adapter
            .explain("SELECT * FROM customer_master")
            .await
            .unwrap();
        assert!(!outcome.is_valid());

        let outcome = adapter
            .explain("SELECT * FROM ssa_order_data")
            .await
            .unwrap();
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn test_connection_failure_mode() {
        let adapter = MockAdapter::new().with_connection_failure();
        assert!(adapter.test_connection().await.is_err());
        assert!(adapter.run_query("SELECT 1").await.is_err());
        assert!(adapter.explain("SELECT 1").await.is_err());
    }

    #[tokio::test]
    async fn test_calls_are_logged_in_order() {
        let adapter = MockAdapter::new();
        adapter.explain("SELECT 1").await.unwrap();
        adapter.run_query("SELECT 1").await.unwrap();

        let calls = adapter.calls().await;
        assert_eq!(calls, vec!["explain SELECT 1", "run_query SELECT 1"]);
    }
}
