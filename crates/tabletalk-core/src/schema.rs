//! Schema document model
//!
//! The typed form of the Markdown schema documentation: tables, typed
//! columns, business-term aliases, and join hints. Table and column order
//! is preserved exactly as written in the document.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SQL column types the documentation may declare
///
/// The set is closed on purpose: the linter rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    /// Variable-length text
    Varchar,

    /// 32-bit integer
    Integer,

    /// 64-bit integer
    BigInt,

    /// Floating point
    Real,

    /// Date (no time component)
    Date,
}

impl SqlType {
    /// All declarable types, in documentation order
    pub const ALL: [SqlType; 5] = [
        SqlType::Varchar,
        SqlType::Integer,
        SqlType::BigInt,
        SqlType::Real,
        SqlType::Date,
    ];

    /// Parse a documentation type token, case-insensitive
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "VARCHAR" => Some(Self::Varchar),
            "INTEGER" => Some(Self::Integer),
            "BIGINT" => Some(Self::BigInt),
            "REAL" => Some(Self::Real),
            "DATE" => Some(Self::Date),
            _ => None,
        }
    }

    /// Canonical uppercase token used in the documentation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Real => "REAL",
            Self::Date => "DATE",
        }
    }

    /// Comma-separated list of every valid token, for diagnostics
    pub fn expected_tokens() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A documented column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table)
    pub name: String,

    /// Declared SQL type
    pub sql_type: SqlType,

    /// Human-readable description
    pub description: String,

    /// Business-term synonyms, matched case-insensitively
    pub aliases: Vec<String>,
}

impl Column {
    /// Create a new column with no description or aliases
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            description: String::new(),
            aliases: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the alias list
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Whether `term` matches one of this column's aliases, case-insensitive
    pub fn has_alias(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.aliases.iter().any(|a| a.to_lowercase() == term)
    }
}

/// A documented table: description plus an ordered column list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name (unique within the document)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            columns: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the column list
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Find a column by name, case-insensitive
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get column names in document order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Reference to a column of a specific table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table name
    pub table: String,

    /// Column name
    pub column: String,
}

impl ColumnRef {
    /// Create a new column reference
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Case-insensitive equality with another reference
    pub fn matches(&self, other: &ColumnRef) -> bool {
        self.table.eq_ignore_ascii_case(&other.table)
            && self.column.eq_ignore_ascii_case(&other.column)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// An equi-join hint between two documented columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinHint {
    /// Left side of the equality
    pub left: ColumnRef,

    /// Right side of the equality
    pub right: ColumnRef,
}

impl JoinHint {
    /// Create a new join hint
    pub fn new(left: ColumnRef, right: ColumnRef) -> Self {
        Self { left, right }
    }

    /// Whether either side references the given table, case-insensitive
    pub fn involves_table(&self, table: &str) -> bool {
        self.left.table.eq_ignore_ascii_case(table)
            || self.right.table.eq_ignore_ascii_case(table)
    }
}

impl std::fmt::Display for JoinHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// The full schema document: ordered tables plus join hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDoc {
    /// Tables in document order
    pub tables: Vec<Table>,

    /// Declared table relationships
    pub join_hints: Vec<JoinHint>,
}

impl SchemaDoc {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            join_hints: Vec::new(),
        }
    }

    /// Create a document from tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self {
            tables,
            join_hints: Vec::new(),
        }
    }

    /// Set the join hints
    pub fn with_join_hints(mut self, join_hints: Vec<JoinHint>) -> Self {
        self.join_hints = join_hints;
        self
    }

    /// Find a table by name, case-insensitive
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Find a column by table and column name, case-insensitive
    pub fn find_column(&self, table: &str, column: &str) -> Option<&Column> {
        self.find_table(table)?.find_column(column)
    }

    /// Get table names in document order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// All columns whose alias set contains `term`, case-insensitive
    ///
    /// The same business term may legitimately resolve to columns in more
    /// than one table; callers disambiguate.
    pub fn resolve_alias(&self, term: &str) -> Vec<(&Table, &Column)> {
        self.tables
            .iter()
            .flat_map(|t| {
                t.columns
                    .iter()
                    .filter(|c| c.has_alias(term))
                    .map(move |c| (t, c))
            })
            .collect()
    }

    /// Whether the document defines no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Content fingerprint: SHA-256 over a canonical rendering, hex-encoded
    ///
    /// Stable across runs for identical content. Used in reports and for
    /// cache keying.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for table in &self.tables {
            hasher.update(b"table\0");
            hasher.update(table.name.as_bytes());
            hasher.update(b"\0");
            hasher.update(table.description.as_bytes());
            for column in &table.columns {
                hasher.update(b"\0col\0");
                hasher.update(column.name.as_bytes());
                hasher.update(b"\0");
                hasher.update(column.sql_type.as_str().as_bytes());
                hasher.update(b"\0");
                hasher.update(column.description.as_bytes());
                for alias in &column.aliases {
                    hasher.update(b"\0alias\0");
                    hasher.update(alias.as_bytes());
                }
            }
        }
        for hint in &self.join_hints {
            hasher.update(b"\0join\0");
            hasher.update(hint.to_string().as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl Default for SchemaDoc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> SchemaDoc {
        let catalog = Table::new("ssa_category_data")
            .with_description("Product catalog")
            .with_columns(vec![
                Column::new("variant_sku", SqlType::Varchar)
                    .with_description("Product identifier")
                    .with_aliases(vec!["sku code".to_string(), "product id".to_string()]),
                Column::new("mrp", SqlType::Real).with_description("Maximum retail price"),
            ]);
        let orders = Table::new("ssa_order_data")
            .with_description("Order lines")
            .with_columns(vec![
                Column::new("sku", SqlType::Varchar),
                Column::new("order_date", SqlType::Date),
            ]);

        SchemaDoc::from_tables(vec![catalog, orders]).with_join_hints(vec![JoinHint::new(
            ColumnRef::new("ssa_order_data", "sku"),
            ColumnRef::new("ssa_category_data", "variant_sku"),
        )])
    }

    #[test]
    fn sql_type_parsing() {
        assert_eq!(SqlType::parse("VARCHAR"), Some(SqlType::Varchar));
        assert_eq!(SqlType::parse("bigint"), Some(SqlType::BigInt));
        assert_eq!(SqlType::parse(" Date "), Some(SqlType::Date));
        assert_eq!(SqlType::parse("DECIMAL"), None);
        assert_eq!(SqlType::parse(""), None);
    }

    #[test]
    fn sql_type_display() {
        assert_eq!(SqlType::BigInt.to_string(), "BIGINT");
        assert_eq!(SqlType::Varchar.to_string(), "VARCHAR");
        assert!(SqlType::expected_tokens().contains("INTEGER"));
    }

    #[test]
    fn table_lookups_are_case_insensitive() {
        let doc = sample_doc();
        assert!(doc.find_table("SSA_Category_Data").is_some());
        assert!(doc.find_column("ssa_order_data", "ORDER_DATE").is_some());
        assert!(doc.find_column("ssa_order_data", "mrp").is_none());
    }

    #[test]
    fn alias_resolution() {
        let doc = sample_doc();

        let matches = doc.resolve_alias("SKU Code");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.name, "ssa_category_data");
        assert_eq!(matches[0].1.name, "variant_sku");

        assert!(doc.resolve_alias("nonexistent term").is_empty());
    }

    #[test]
    fn join_hint_display() {
        let doc = sample_doc();
        assert_eq!(
            doc.join_hints[0].to_string(),
            "ssa_order_data.sku = ssa_category_data.variant_sku"
        );
        assert!(doc.join_hints[0].involves_table("SSA_ORDER_DATA"));
        assert!(!doc.join_hints[0].involves_table("unrelated"));
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let doc = sample_doc();
        let fp1 = doc.fingerprint();
        let fp2 = sample_doc().fingerprint();
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), 64);

        let mut changed = sample_doc();
        changed.tables[0].columns[1].description = "Different".to_string();
        assert_ne!(fp1, changed.fingerprint());
    }

    #[test]
    fn column_order_is_preserved() {
        let doc = sample_doc();
        assert_eq!(
            doc.tables[1].column_names(),
            vec!["sku", "order_date"]
        );
        assert_eq!(
            doc.table_names(),
            vec!["ssa_category_data", "ssa_order_data"]
        );
    }
}
