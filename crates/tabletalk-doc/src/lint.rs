//! Structural checks over a parsed schema document
//!
//! The linter validates the document against itself: join hints must point
//! at documented columns, declared types must be supported, and names must
//! be unique. It never talks to a live database.

use crate::parser::ParsedDoc;
use std::collections::HashMap;
use tabletalk_core::{Diagnostic, DiagnosticCode, Location, SchemaDoc, Severity};

/// Lint a schema document model
///
/// Works on any `SchemaDoc`, parsed or built in code. Diagnostics carry the
/// file name but no line numbers; line-accurate findings come from the
/// parser.
pub fn lint(doc: &SchemaDoc, file: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let here = || Location::new(file);

    if doc.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DocNoTables,
                Severity::Error,
                "Document defines no tables",
            )
            .with_location(here()),
        );
        return diagnostics;
    }

    // Duplicate table names (model-level; the parser also catches these with
    // line numbers when reading a file).
    let mut seen_tables: HashMap<String, &str> = HashMap::new();
    for table in &doc.tables {
        if let Some(first) = seen_tables.insert(table.name.to_lowercase(), &table.name) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DocDuplicateTable,
                    Severity::Error,
                    format!("Table '{}' is defined more than once", first),
                )
                .with_location(here()),
            );
        }
    }

    for table in &doc.tables {
        if table.columns.is_empty() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DocEmptyTable,
                    Severity::Warn,
                    format!("Table '{}' defines no columns", table.name),
                )
                .with_location(here()),
            );
        }
        if table.description.trim().is_empty() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DocMissingDescription,
                    Severity::Warn,
                    format!("Table '{}' has no description", table.name),
                )
                .with_location(here()),
            );
        }

        let mut seen_columns: HashMap<String, &str> = HashMap::new();
        for column in &table.columns {
            if let Some(first) = seen_columns.insert(column.name.to_lowercase(), &column.name) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DocDuplicateColumn,
                        Severity::Error,
                        format!(
                            "Column '{}' is defined more than once in table '{}'",
                            first, table.name
                        ),
                    )
                    .with_location(here()),
                );
            }
            if column.description.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DocMissingDescription,
                        Severity::Warn,
                        format!(
                            "Column '{}.{}' has no description",
                            table.name, column.name
                        ),
                    )
                    .with_location(here()),
                );
            }
        }
    }

    // An alias pointing at two columns makes term resolution ambiguous.
    let mut alias_targets: HashMap<String, Vec<String>> = HashMap::new();
    for table in &doc.tables {
        for column in &table.columns {
            for alias in &column.aliases {
                alias_targets
                    .entry(alias.to_lowercase())
                    .or_default()
                    .push(format!("{}.{}", table.name, column.name));
            }
        }
    }
    let mut ambiguous: Vec<_> = alias_targets
        .iter()
        .filter(|(_, targets)| targets.len() > 1)
        .collect();
    ambiguous.sort_by(|a, b| a.0.cmp(b.0));
    for (alias, targets) in ambiguous {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DocDuplicateAlias,
                Severity::Warn,
                format!(
                    "Alias '{}' resolves to multiple columns: {}",
                    alias,
                    targets.join(", ")
                ),
            )
            .with_location(here()),
        );
    }

    for hint in &doc.join_hints {
        for side in [&hint.left, &hint.right] {
            match doc.find_table(&side.table) {
                None => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::JoinUnknownTable,
                        Severity::Error,
                        format!(
                            "Relationship '{}' references undocumented table '{}'",
                            hint, side.table
                        ),
                    )
                    .with_location(here()),
                ),
                Some(table) if table.find_column(&side.column).is_none() => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::JoinUnknownColumn,
                        Severity::Error,
                        format!(
                            "Relationship '{}' references missing column '{}.{}'",
                            hint, side.table, side.column
                        ),
                    )
                    .with_location(here()),
                ),
                Some(_) => {}
            }
        }
        if hint.left.matches(&hint.right) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::JoinSelfReference,
                    Severity::Warn,
                    format!("Relationship '{}' joins a column to itself", hint),
                )
                .with_location(here()),
            );
        }
    }

    diagnostics
}

/// Parse-stage diagnostics plus lint findings, in one list
pub fn check(parsed: &ParsedDoc) -> Vec<Diagnostic> {
    let mut diagnostics = parsed.diagnostics.clone();
    diagnostics.extend(lint(&parsed.doc, &parsed.file));
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_core::{Column, ColumnRef, JoinHint, SqlType, Table};

    fn described(table: Table) -> Table {
        let name = table.name.clone();
        table.with_description(format!("{} rows", name))
    }

    fn doc_with_tables() -> SchemaDoc {
        let catalog = described(Table::new("ssa_category_data")).with_columns(vec![
            Column::new("variant_sku", SqlType::Varchar).with_description("Variant id"),
            Column::new("mrp", SqlType::Real).with_description("Price"),
        ]);
        let orders = described(Table::new("ssa_order_data")).with_columns(vec![
            Column::new("sku", SqlType::Varchar).with_description("Product"),
            Column::new("order_date", SqlType::Date).with_description("Date"),
        ]);
        SchemaDoc::from_tables(vec![catalog, orders])
    }

    fn codes(diags: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diags.iter().map(|d| d.code).collect()
    }

    #[test]
    fn clean_document_passes() {
        let doc = doc_with_tables().with_join_hints(vec![JoinHint::new(
            ColumnRef::new("ssa_order_data", "sku"),
            ColumnRef::new("ssa_category_data", "variant_sku"),
        )]);
        assert!(lint(&doc, "doc.md").is_empty());
    }

    #[test]
    fn empty_document_is_an_error() {
        let diags = lint(&SchemaDoc::new(), "doc.md");
        assert_eq!(codes(&diags), vec![DiagnosticCode::DocNoTables]);
    }

    #[test]
    fn join_hint_to_unknown_table() {
        let doc = doc_with_tables().with_join_hints(vec![JoinHint::new(
            ColumnRef::new("ssa_order_data", "sku"),
            ColumnRef::new("warehouse_stock", "sku"),
        )]);
        let diags = lint(&doc, "doc.md");
        assert_eq!(codes(&diags), vec![DiagnosticCode::JoinUnknownTable]);
        assert!(diags[0].message.contains("warehouse_stock"));
    }

    #[test]
    fn join_hint_to_missing_column() {
        let doc = doc_with_tables().with_join_hints(vec![JoinHint::new(
            ColumnRef::new("ssa_order_data", "sku"),
            ColumnRef::new("ssa_category_data", "sku_variant"),
        )]);
        let diags = lint(&doc, "doc.md");
        assert_eq!(codes(&diags), vec![DiagnosticCode::JoinUnknownColumn]);
    }

    #[test]
    fn join_hint_column_match_is_case_insensitive() {
        let doc = doc_with_tables().with_join_hints(vec![JoinHint::new(
            ColumnRef::new("SSA_Order_Data", "SKU"),
            ColumnRef::new("ssa_category_data", "VARIANT_SKU"),
        )]);
        assert!(lint(&doc, "doc.md").is_empty());
    }

    #[test]
    fn self_referencing_hint_warns() {
        let doc = doc_with_tables().with_join_hints(vec![JoinHint::new(
            ColumnRef::new("ssa_order_data", "sku"),
            ColumnRef::new("ssa_order_data", "sku"),
        )]);
        let diags = lint(&doc, "doc.md");
        assert_eq!(codes(&diags), vec![DiagnosticCode::JoinSelfReference]);
        assert_eq!(diags[0].severity, Severity::Warn);
    }

    #[test]
    fn duplicate_columns_in_model() {
        let table = described(Table::new("ssa_order_data")).with_columns(vec![
            Column::new("sku", SqlType::Varchar).with_description("Product"),
            Column::new("SKU", SqlType::Integer).with_description("Product again"),
        ]);
        let diags = lint(&SchemaDoc::from_tables(vec![table]), "doc.md");
        assert!(codes(&diags).contains(&DiagnosticCode::DocDuplicateColumn));
    }

    #[test]
    fn empty_table_and_missing_descriptions_warn() {
        let doc = SchemaDoc::from_tables(vec![Table::new("bare")]);
        let diags = lint(&doc, "doc.md");
        let found = codes(&diags);
        assert!(found.contains(&DiagnosticCode::DocEmptyTable));
        assert!(found.contains(&DiagnosticCode::DocMissingDescription));
        assert!(diags.iter().all(|d| d.severity == Severity::Warn));
    }

    #[test]
    fn ambiguous_alias_warns() {
        let catalog = described(Table::new("ssa_category_data")).with_columns(vec![Column::new(
            "variant_sku",
            SqlType::Varchar,
        )
        .with_description("Variant")
        .with_aliases(vec!["product code".to_string()])]);
        let orders = described(Table::new("ssa_order_data")).with_columns(vec![Column::new(
            "sku",
            SqlType::Varchar,
        )
        .with_description("Product")
        .with_aliases(vec!["Product Code".to_string()])]);

        let diags = lint(&SchemaDoc::from_tables(vec![catalog, orders]), "doc.md");
        assert_eq!(codes(&diags), vec![DiagnosticCode::DocDuplicateAlias]);
        assert!(diags[0].message.contains("ssa_category_data.variant_sku"));
        assert!(diags[0].message.contains("ssa_order_data.sku"));
    }

    #[test]
    fn check_combines_parse_and_lint_findings() {
        let source = "## ssa_order_data\n\n- `total` (MONEY): Order total\n";
        let parsed = crate::parser::parse_str(source, "doc.md");
        let diags = check(&parsed);
        let found = codes(&diags);
        // Unknown type from the parser, missing description from the linter.
        assert!(found.contains(&DiagnosticCode::DocUnknownType));
        assert!(found.contains(&DiagnosticCode::DocMissingDescription));
    }
}
