//! What comes back from the database: schema snapshots and query results

use serde::{Deserialize, Serialize};

/// A column as reported by information_schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveColumn {
    /// Column name
    pub name: String,

    /// Database type name, verbatim (e.g., "character varying")
    pub data_type: String,

    /// Whether the column accepts NULL
    pub is_nullable: bool,
}

/// A table as reported by information_schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTable {
    /// Table name
    pub name: String,

    /// Columns in ordinal position order
    pub columns: Vec<LiveColumn>,
}

impl LiveTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<LiveColumn>) -> Self {
        self.columns = columns;
        self
    }

    /// Find a column by name (case-insensitive)
    pub fn find_column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A snapshot of one database schema at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSchema {
    /// Schema (namespace) name, e.g. "public"
    pub schema_name: String,

    /// Tables in name order
    pub tables: Vec<LiveTable>,
}

impl LiveSchema {
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_tables(mut self, tables: Vec<LiveTable>) -> Self {
        self.tables = tables;
        self
    }

    /// Find a table by name (case-insensitive)
    pub fn find_table(&self, name: &str) -> Option<&LiveTable> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// All table names in snapshot order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the snapshot as markdown for display next to the
    /// documentation.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Live Schema: {}\n", self.schema_name));
        for table in &self.tables {
            out.push('\n');
            out.push_str(&format!("## Table: {}\n\n", table.name));
            for column in &table.columns {
                if column.is_nullable {
                    out.push_str(&format!(
                        "- `{}` ({}, nullable)\n",
                        column.name, column.data_type
                    ));
                } else {
                    out.push_str(&format!("- `{}` ({})\n", column.name, column.data_type));
                }
            }
        }
        out
    }
}

/// Rows returned by a read-only query, decoded as text
///
/// The simple query protocol returns every cell as an optional string,
/// which sidesteps per-type decoding and is exactly what both the CLI
/// table and the analysis prompt need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRows {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Row cells; `None` is SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// An empty result set with no column information
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// A one-column, one-row result, convenient in tests
    pub fn single(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            rows: vec![vec![Some(value.into())]],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The lone cell of a one-row, one-column result, if that is what
    /// this is. NULL reads as "NULL".
    pub fn single_value(&self) -> Option<&str> {
        if self.rows.len() == 1 && self.columns.len() == 1 {
            match self.rows[0].first() {
                Some(Some(value)) => Some(value.as_str()),
                _ => Some("NULL"),
            }
        } else {
            None
        }
    }

    /// Render the result as a markdown table.
    pub fn to_markdown(&self) -> String {
        if self.columns.is_empty() {
            return "(no rows)".to_string();
        }
        let mut out = String::new();
        out.push_str("| ");
        out.push_str(&self.columns.join(" | "));
        out.push_str(" |\n|");
        for _ in &self.columns {
            out.push_str(" --- |");
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str("| ");
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
            out.push_str(&cells.join(" | "));
            out.push_str(" |\n");
        }
        out
    }
}
