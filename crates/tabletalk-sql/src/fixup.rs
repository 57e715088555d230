//! Dialect fixups for model-generated SQL
//!
//! Local models trained mostly on MySQL answer PostgreSQL questions with
//! MySQL habits: backticked identifiers, `NOW()`, `IFNULL`, `DATE(col)`,
//! two-argument `ROUND` on floats, BigQuery's `FORMAT_DATE`. Each of
//! these has a mechanical PostgreSQL equivalent, so rather than burning a
//! retry on an EXPLAIN failure we rewrite them up front. Quoting is fixed
//! on the raw text before parsing; everything else is rewritten on the
//! AST and re-rendered.

use sqlparser::ast::{
    visit_expressions_mut, CastKind, DataType, ExactNumberInfo, Expr, Function, FunctionArg,
    FunctionArgExpr, FunctionArguments, Ident, ObjectName, Value,
};
use std::ops::ControlFlow;

use crate::guard::{ParsedQuery, SqlGuard, SqlGuardError};

/// Replace MySQL backtick quoting with standard double quotes.
///
/// Runs on the raw text because backticks do not survive parsing in a
/// PostgreSQL-compatible dialect. Backticks inside single-quoted string
/// literals are left alone.
pub fn normalize_identifier_quoting(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '`' if !in_string => out.push('"'),
            _ => out.push(ch),
        }
    }
    out
}

/// Rewrite known MySQL and BigQuery constructs into their PostgreSQL
/// equivalents, in place, and refresh the rendered SQL.
pub fn rewrite_for_postgres(parsed: &mut ParsedQuery) {
    let _: ControlFlow<()> = visit_expressions_mut(&mut parsed.query, |expr| {
        rewrite_expr(expr);
        ControlFlow::Continue(())
    });
    parsed.sql = parsed.query.to_string();
}

/// Normalize quoting, parse through the guard, apply all PostgreSQL
/// rewrites, and return the repaired SQL.
pub fn fix_postgres_sql(sql: &str) -> Result<String, SqlGuardError> {
    let normalized = normalize_identifier_quoting(sql);
    let mut parsed = SqlGuard::new().check(&normalized)?;
    rewrite_for_postgres(&mut parsed);
    Ok(parsed.sql)
}

/// Translate a strftime-style format string to PostgreSQL `TO_CHAR`
/// patterns.
pub fn translate_strftime(format: &str) -> String {
    const PATTERNS: [(&str, &str); 11] = [
        ("%B", "Month"),
        ("%b", "Mon"),
        ("%A", "Day"),
        ("%a", "Dy"),
        ("%Y", "YYYY"),
        ("%y", "YY"),
        ("%m", "MM"),
        ("%d", "DD"),
        ("%H", "HH24"),
        ("%M", "MI"),
        ("%S", "SS"),
    ];
    let mut out = format.to_string();
    for (from, to) in PATTERNS {
        out = out.replace(from, to);
    }
    out
}

fn rewrite_expr(expr: &mut Expr) {
    let replacement = match expr {
        Expr::Function(func) => rewrite_function(func),
        _ => None,
    };
    if let Some(new_expr) = replacement {
        *expr = new_expr;
    }
}

/// Rewrite a single function call. Returns a replacement expression when
/// the fix changes the node kind, or mutates the call in place otherwise.
fn rewrite_function(func: &mut Function) -> Option<Expr> {
    let name = func.name.to_string().to_uppercase();
    match name.as_str() {
        "NOW" => {
            func.name = ObjectName(vec![Ident::new("CURRENT_TIMESTAMP")]);
            func.args = FunctionArguments::None;
            None
        }
        "IFNULL" => {
            func.name = ObjectName(vec![Ident::new("COALESCE")]);
            None
        }
        // DATE(col) truncates in MySQL; PostgreSQL spells it as a cast.
        "DATE" => single_argument(&func.args).map(|inner| Expr::Cast {
            kind: CastKind::Cast,
            expr: Box::new(inner),
            data_type: DataType::Date,
            format: None,
        }),
        "ROUND" => {
            wrap_round_target(func);
            None
        }
        "FORMAT_DATE" => {
            rewrite_format_date(func);
            None
        }
        _ => None,
    }
}

/// Two-argument ROUND requires a NUMERIC first argument on PostgreSQL,
/// where aggregates over REAL columns produce DOUBLE PRECISION.
fn wrap_round_target(func: &mut Function) {
    if let FunctionArguments::List(list) = &mut func.args {
        if list.args.len() == 2 {
            if let FunctionArg::Unnamed(FunctionArgExpr::Expr(target)) = &mut list.args[0] {
                if !matches!(target, Expr::Cast { .. }) {
                    let inner = std::mem::replace(target, Expr::Value(Value::Null));
                    *target = Expr::Cast {
                        kind: CastKind::Cast,
                        expr: Box::new(inner),
                        data_type: DataType::Numeric(ExactNumberInfo::None),
                        format: None,
                    };
                }
            }
        }
    }
}

/// `FORMAT_DATE('%B', col)` becomes `TO_CHAR(col, 'Month')`: arguments
/// swap places and the format string is translated.
fn rewrite_format_date(func: &mut Function) {
    if let FunctionArguments::List(list) = &mut func.args {
        if list.args.len() == 2 {
            let format = if let FunctionArg::Unnamed(FunctionArgExpr::Expr(Expr::Value(
                Value::SingleQuotedString(s),
            ))) = &list.args[0]
            {
                Some(s.clone())
            } else {
                None
            };
            if let Some(format) = format {
                let column = list.args.remove(1);
                list.args.clear();
                list.args.push(column);
                list.args.push(FunctionArg::Unnamed(FunctionArgExpr::Expr(Expr::Value(
                    Value::SingleQuotedString(translate_strftime(&format)),
                ))));
                func.name = ObjectName(vec![Ident::new("TO_CHAR")]);
            }
        }
    }
}

fn single_argument(args: &FunctionArguments) -> Option<Expr> {
    if let FunctionArguments::List(list) = args {
        if list.args.len() == 1 {
            if let FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) = &list.args[0] {
                return Some(expr.clone());
            }
        }
    }
    None
}
