//! Document rendering
//!
//! Two render targets: the canonical Markdown form of a schema document,
//! and the compact context block embedded into generation prompts.

use tabletalk_core::SchemaDoc;

/// Render the canonical Markdown form of a document
///
/// Relationships come first, then tables, matching the documented file
/// layout. Parsing the output yields an equivalent model.
pub fn render_markdown(doc: &SchemaDoc) -> String {
    let mut out = String::new();

    if !doc.join_hints.is_empty() {
        out.push_str("## Table Relationships\n\n");
        for hint in &doc.join_hints {
            out.push_str(&format!(
                "- `{}.{}` = `{}.{}`\n",
                hint.left.table, hint.left.column, hint.right.table, hint.right.column
            ));
        }
        out.push('\n');
    }

    for table in &doc.tables {
        out.push_str(&format!("## Table: {}\n\n", table.name));
        if !table.description.is_empty() {
            out.push_str(&table.description);
            out.push_str("\n\n");
        }
        for column in &table.columns {
            out.push_str(&format!(
                "- `{}` ({}): {}\n",
                column.name, column.sql_type, column.description
            ));
            if !column.aliases.is_empty() {
                let quoted: Vec<String> =
                    column.aliases.iter().map(|a| format!("\"{}\"", a)).collect();
                out.push_str(&format!("  - Aliases: {}\n", quoted.join(", ")));
            }
        }
        out.push('\n');
    }

    out.trim_end().to_string() + "\n"
}

/// Render the compact schema block for generation prompts
pub fn render_prompt_context(doc: &SchemaDoc) -> String {
    let mut out = String::new();

    for table in &doc.tables {
        out.push_str(&format!("Table: {}\n", table.name));
        if !table.description.is_empty() {
            out.push_str(&format!("Description: {}\n", table.description));
        }
        for column in &table.columns {
            out.push_str(&format!(
                "  - {} ({}): {}",
                column.name, column.sql_type, column.description
            ));
            if !column.aliases.is_empty() {
                out.push_str(&format!(" [aka: {}]", column.aliases.join(", ")));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !doc.join_hints.is_empty() {
        out.push_str("Relationships:\n");
        for hint in &doc.join_hints {
            out.push_str(&format!("  {}\n", hint));
        }
    }

    out.trim_end().to_string() + "\n"
}
