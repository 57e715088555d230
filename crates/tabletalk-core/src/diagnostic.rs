//! Diagnostic codes and structured findings
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Documentation structure (1xxx)
    /// Two table sections share a name
    DocDuplicateTable,

    /// Two columns in one table share a name
    DocDuplicateColumn,

    /// A column declares a type outside the supported set
    DocUnknownType,

    /// A table or column has an empty description
    DocMissingDescription,

    /// A table section defines no columns
    DocEmptyTable,

    /// The same alias resolves to more than one column
    DocDuplicateAlias,

    /// A column entry that could not be parsed
    DocMalformedColumn,

    /// The document defines no tables at all
    DocNoTables,

    // Join hints (2xxx)
    /// A relationship references a table the document does not define
    JoinUnknownTable,

    /// A relationship references a column missing from its table
    JoinUnknownColumn,

    /// Both sides of a relationship are the same column
    JoinSelfReference,

    /// A relationship line that could not be parsed
    JoinMalformed,

    // Generated SQL (3xxx)
    /// Failed to parse SQL
    SqlParseError,

    /// Statement is not a read-only query
    SqlNotReadOnly,

    /// More than one statement where a single query was expected
    SqlMultipleStatements,

    /// Query references a table the documentation does not define
    SqlUnknownTable,

    /// Query references a column the documentation does not define
    SqlUnknownColumn,

    // General (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocDuplicateTable => "DOC_DUPLICATE_TABLE",
            Self::DocDuplicateColumn => "DOC_DUPLICATE_COLUMN",
            Self::DocUnknownType => "DOC_UNKNOWN_TYPE",
            Self::DocMissingDescription => "DOC_MISSING_DESCRIPTION",
            Self::DocEmptyTable => "DOC_EMPTY_TABLE",
            Self::DocDuplicateAlias => "DOC_DUPLICATE_ALIAS",
            Self::DocMalformedColumn => "DOC_MALFORMED_COLUMN",
            Self::DocNoTables => "DOC_NO_TABLES",
            Self::JoinUnknownTable => "JOIN_UNKNOWN_TABLE",
            Self::JoinUnknownColumn => "JOIN_UNKNOWN_COLUMN",
            Self::JoinSelfReference => "JOIN_SELF_REFERENCE",
            Self::JoinMalformed => "JOIN_MALFORMED",
            Self::SqlParseError => "SQL_PARSE_ERROR",
            Self::SqlNotReadOnly => "SQL_NOT_READ_ONLY",
            Self::SqlMultipleStatements => "SQL_MULTIPLE_STATEMENTS",
            Self::SqlUnknownTable => "SQL_UNKNOWN_TABLE",
            Self::SqlUnknownColumn => "SQL_UNKNOWN_COLUMN",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,

    /// Optional column number (1-indexed)
    pub column: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: None,
        }
    }

    /// Create a location with file, line, and column
    pub fn with_position(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}:{}", self.file, line, column),
            (Some(line), None) => write!(f, "{}:{}", self.file, line),
            _ => write!(f, "{}", self.file),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}
