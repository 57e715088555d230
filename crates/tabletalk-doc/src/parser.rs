//! Markdown schema documentation parser
//!
//! The documentation format is plain Markdown: an optional
//! "Table Relationships" section of equi-join bullets, then one section per
//! table with a description paragraph, column bullets, and optional alias
//! sub-bullets. Anything else is prose and stays out of the model.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tabletalk_core::{
    Column, ColumnRef, Diagnostic, DiagnosticCode, JoinHint, Location, SchemaDoc, Severity,
    SqlType, Table,
};

/// A parsed document plus everything found wrong while parsing it
#[derive(Debug, Clone)]
pub struct ParsedDoc {
    /// The typed model
    pub doc: SchemaDoc,

    /// Source file name, used in diagnostic locations
    pub file: String,

    /// Parse-stage diagnostics (malformed entries, duplicates, unknown types)
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedDoc {
    /// Whether any parse-stage diagnostic is an error
    pub fn has_parse_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Documentation file errors
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: String, reason: String },
}

/// Parse a schema documentation file
pub fn parse_document(path: &Path) -> Result<ParsedDoc, DocError> {
    let source = std::fs::read_to_string(path).map_err(|e| DocError::ReadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(parse_str(&source, &path.display().to_string()))
}

/// Parse schema documentation from a string
pub fn parse_str(source: &str, file: &str) -> ParsedDoc {
    let mut tables: Vec<Table> = Vec::new();
    let mut join_hints: Vec<JoinHint> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    // Index into `tables` for the section being filled; None outside table
    // sections and inside skipped (duplicate) sections.
    let mut current: Option<usize> = None;
    let mut in_relationships = false;
    let mut description_done = false;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;

        if let Some((level, text)) = heading(line) {
            current = None;
            in_relationships = false;
            description_done = false;

            if text.to_lowercase().contains("table relationships") {
                in_relationships = true;
                continue;
            }
            // Level-1 headings are the document title, not table sections.
            if level == 1 {
                continue;
            }
            if let Some(name) = table_name(text) {
                if tables.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::DocDuplicateTable,
                            Severity::Error,
                            format!("Table '{}' is defined more than once", name),
                        )
                        .with_location(Location::with_line(file, line_no)),
                    );
                } else {
                    tables.push(Table::new(name));
                    current = Some(tables.len() - 1);
                }
            }
            continue;
        }

        if in_relationships {
            if let Some(text) = bullet(line) {
                match parse_relationship(text) {
                    Some(hint) => join_hints.push(hint),
                    None => diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::JoinMalformed,
                            Severity::Error,
                            format!("Relationship line does not parse: '{}'", text.trim()),
                        )
                        .with_location(Location::with_line(file, line_no)),
                    ),
                }
            }
            continue;
        }

        let Some(table_idx) = current else {
            continue;
        };

        if let Some(text) = bullet(line) {
            description_done = true;

            if let Some(aliases) = parse_alias_line(text) {
                match tables[table_idx].columns.last_mut() {
                    Some(column) => column.aliases.extend(aliases),
                    None => diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::DocMalformedColumn,
                            Severity::Error,
                            "Alias line has no preceding column entry",
                        )
                        .with_location(Location::with_line(file, line_no)),
                    ),
                }
                continue;
            }

            match parse_column(text) {
                Some(ColumnEntry {
                    column,
                    unknown_type,
                }) => {
                    if let Some(token) = unknown_type {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticCode::DocUnknownType,
                                Severity::Error,
                                format!(
                                    "Column '{}' declares unsupported type '{}'",
                                    column.name, token
                                ),
                            )
                            .with_comparison(SqlType::expected_tokens(), token)
                            .with_location(Location::with_line(file, line_no)),
                        );
                    }
                    let table = &mut tables[table_idx];
                    if table.find_column(&column.name).is_some() {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticCode::DocDuplicateColumn,
                                Severity::Error,
                                format!(
                                    "Column '{}' is defined more than once in table '{}'",
                                    column.name, table.name
                                ),
                            )
                            .with_location(Location::with_line(file, line_no)),
                        );
                    } else {
                        table.columns.push(column);
                    }
                }
                None if looks_like_column(text) => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DocMalformedColumn,
                        Severity::Error,
                        format!("Column entry does not parse: '{}'", text.trim()),
                    )
                    .with_location(Location::with_line(file, line_no)),
                ),
                None => {}
            }
            continue;
        }

        // Prose: the first paragraph after the heading is the description.
        let trimmed = line.trim();
        if !description_done {
            if trimmed.is_empty() {
                if !tables[table_idx].description.is_empty() {
                    description_done = true;
                }
            } else {
                let table = &mut tables[table_idx];
                if table.description.is_empty() {
                    table.description = trimmed.to_string();
                } else {
                    table.description.push(' ');
                    table.description.push_str(trimmed);
                }
            }
        }
    }

    ParsedDoc {
        doc: SchemaDoc::from_tables(tables).with_join_hints(join_hints),
        file: file.to_string(),
        diagnostics,
    }
}

struct ColumnEntry {
    column: Column,
    /// The declared token when it is not a supported type
    unknown_type: Option<String>,
}

fn column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^`?([A-Za-z_][A-Za-z0-9_]*)`?\s*\(([^)]*)\)\s*:\s*(.*)$")
            .expect("column pattern compiles")
    })
}

fn quoted_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("quoted pattern compiles"))
}

/// Parse a column bullet: `` `name` (TYPE): description ``
fn parse_column(text: &str) -> Option<ColumnEntry> {
    let caps = column_regex().captures(text.trim())?;
    let name = caps.get(1)?.as_str();
    let token = caps.get(2)?.as_str().trim();
    let description = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();

    let (sql_type, unknown_type) = match SqlType::parse(token) {
        Some(t) => (t, None),
        // Keep the column under the closest type so SQL grounding still
        // knows the name; the diagnostic fails the check.
        None => (SqlType::Varchar, Some(token.to_string())),
    };

    Some(ColumnEntry {
        column: Column::new(name, sql_type).with_description(description),
        unknown_type,
    })
}

/// Case-insensitive ASCII prefix strip
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Parse an alias sub-bullet: `Aliases: "a", "b"`
fn parse_alias_line(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    let rest = strip_prefix_ci(trimmed, "aliases:")
        .or_else(|| strip_prefix_ci(trimmed, "alias:"))?;

    let quoted: Vec<String> = quoted_regex()
        .captures_iter(rest)
        .map(|c| c[1].trim().to_string())
        .collect();
    if !quoted.is_empty() {
        return Some(quoted);
    }

    Some(
        rest.split(',')
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Parse a relationship bullet: `` `TableA.col` = `TableB.col` ``
fn parse_relationship(text: &str) -> Option<JoinHint> {
    let (lhs, rhs) = text.split_once('=')?;
    let left = parse_column_ref(lhs)?;
    let right = parse_column_ref(rhs)?;
    Some(JoinHint::new(left, right))
}

fn parse_column_ref(raw: &str) -> Option<ColumnRef> {
    let cleaned = raw.trim().trim_matches('`').trim();
    let (table, column) = cleaned.split_once('.')?;
    let table = table.trim();
    let column = column.trim();
    if !is_identifier(table) || !is_identifier(column) {
        return None;
    }
    Some(ColumnRef::new(table, column))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Split a heading line into (level, text)
fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((hashes, rest.trim()))
}

/// Extract a table name from a section heading, or None for prose headings
fn table_name(text: &str) -> Option<String> {
    let rest = strip_prefix_ci(text, "table:").unwrap_or(text);
    let name = rest.trim().trim_matches('`').trim();
    if is_identifier(name) {
        Some(name.to_string())
    } else {
        None
    }
}

/// Strip a bullet marker, returning the text after it
fn bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
}

/// Whether a bullet was probably meant to be a column entry
fn looks_like_column(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.starts_with('`') {
        return true;
    }
    let ident_len = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    ident_len > 0 && trimmed[ident_len..].trim_start().starts_with('(')
}
