//! Pulling a SQL statement out of raw language-model output
//!
//! Models rarely return bare SQL. Typical output wraps the statement in
//! prose ("Here is the query you asked for:"), markdown code fences, or
//! a trailing explanation after the closing semicolon. Extraction finds
//! the first `SELECT` or `WITH` keyword, takes everything from there,
//! and cuts the tail at the closing fence or the last semicolon.

use regex::Regex;
use std::sync::OnceLock;

fn statement_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(SELECT|WITH)\b").expect("statement regex compiles"))
}

/// Extract the SQL statement from raw model output.
///
/// Returns `None` when the output contains no `SELECT` or `WITH` at all,
/// which is how refusals and pure-prose answers surface. The returned
/// string is trimmed and has no trailing semicolon; it still needs to go
/// through [`SqlGuard`](crate::SqlGuard) before anything trusts it.
pub fn extract_sql(raw: &str) -> Option<String> {
    let start = statement_start().find(raw)?.start();
    let mut sql = &raw[start..];
    // A closing code fence means everything after it is commentary.
    if let Some(fence) = sql.find("```") {
        sql = &sql[..fence];
    }
    // Keep everything up to the last semicolon so that string literals
    // containing ';' survive, but trailing prose does not.
    if let Some(semicolon) = sql.rfind(';') {
        sql = &sql[..semicolon];
    }
    let sql = sql.trim();
    if sql.is_empty() {
        None
    } else {
        Some(sql.to_string())
    }
}
