//! Schema grounding for generated SQL
//!
//! A statement can parse cleanly and still be hallucinated: models invent
//! plausible table names and columns that were never documented. The
//! grounding check walks the query AST, collects every table and column
//! reference together with the scopes that could legitimately introduce
//! them (CTEs, derived tables, FROM aliases, SELECT-list aliases), and
//! reports anything that does not resolve to the documented schema.
//!
//! The check is deliberately conservative about columns: a bare column
//! is only validated when the query references documented base tables
//! exclusively, because a CTE or derived table can introduce columns the
//! documentation knows nothing about. Table references are always
//! validated.

use std::collections::{HashMap, HashSet};

use sqlparser::ast::{
    Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, JoinConstraint,
    JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, TableFactor, TableWithJoins,
    WindowType,
};
use tabletalk_core::{Diagnostic, DiagnosticCode, SchemaDoc, Severity};

/// Validates table and column references in a query against a schema
/// document.
pub struct GroundingCheck<'a> {
    doc: &'a SchemaDoc,
}

impl<'a> GroundingCheck<'a> {
    pub fn new(doc: &'a SchemaDoc) -> Self {
        Self { doc }
    }

    /// Walk the query and report every reference that does not resolve.
    pub fn check(&self, query: &Query) -> Vec<Diagnostic> {
        let mut scope = QueryScope::default();
        collect_query(query, &mut scope);
        self.evaluate(&scope)
    }

    fn evaluate(&self, scope: &QueryScope) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |diagnostics: &mut Vec<Diagnostic>, diag: Diagnostic| {
            if seen.insert(diag.message.clone()) {
                diagnostics.push(diag);
            }
        };

        let documented = self.doc.table_names().join(", ");
        let mut referenced_tables = HashSet::new();
        let mut all_relations_documented = true;

        for relation in &scope.relations {
            let table = last_part(relation);
            if scope.synthetic.contains(&table.to_lowercase()) {
                continue;
            }
            referenced_tables.insert(table.to_lowercase());
            if self.doc.find_table(table).is_none() {
                all_relations_documented = false;
                push(
                    &mut diagnostics,
                    Diagnostic::new(
                        DiagnosticCode::SqlUnknownTable,
                        Severity::Error,
                        format!("Query references table '{relation}' which is not documented"),
                    )
                    .with_comparison(documented.clone(), relation.clone()),
                );
            }
        }

        for reference in &scope.columns {
            match &reference.qualifier {
                Some(qualifier) => {
                    let key = qualifier.to_lowercase();
                    if scope.synthetic.contains(&key) {
                        continue;
                    }
                    let target = scope
                        .aliases
                        .get(&key)
                        .cloned()
                        .unwrap_or_else(|| qualifier.clone());
                    if scope.synthetic.contains(&target.to_lowercase()) {
                        continue;
                    }
                    match self.doc.find_table(&target) {
                        Some(table) => {
                            if reference.column != "*"
                                && table.find_column(&reference.column).is_none()
                            {
                                push(
                                    &mut diagnostics,
                                    Diagnostic::new(
                                        DiagnosticCode::SqlUnknownColumn,
                                        Severity::Error,
                                        format!(
                                            "Column '{}.{}' is not documented for table '{}'",
                                            qualifier, reference.column, table.name
                                        ),
                                    )
                                    .with_comparison(
                                        table.column_names().join(", "),
                                        reference.column.clone(),
                                    ),
                                );
                            }
                        }
                        None => {
                            // The bad relation itself was reported above;
                            // only flag qualifiers that resolve to nothing.
                            if !referenced_tables.contains(&target.to_lowercase()) {
                                push(
                                    &mut diagnostics,
                                    Diagnostic::new(
                                        DiagnosticCode::SqlUnknownTable,
                                        Severity::Error,
                                        format!(
                                            "Qualifier '{qualifier}' does not match any \
                                             documented table or alias in the query"
                                        ),
                                    ),
                                );
                            }
                        }
                    }
                }
                None => {
                    // Bare columns are only checkable when every relation
                    // in scope is a documented base table.
                    if !scope.synthetic.is_empty() || !all_relations_documented {
                        continue;
                    }
                    if scope
                        .output_aliases
                        .contains(&reference.column.to_lowercase())
                    {
                        continue;
                    }
                    let tables: Vec<_> = scope
                        .relations
                        .iter()
                        .filter_map(|r| self.doc.find_table(last_part(r)))
                        .collect();
                    if tables.is_empty() {
                        continue;
                    }
                    if tables.iter().all(|t| t.find_column(&reference.column).is_none()) {
                        let available = tables
                            .iter()
                            .flat_map(|t| t.column_names())
                            .collect::<Vec<_>>()
                            .join(", ");
                        push(
                            &mut diagnostics,
                            Diagnostic::new(
                                DiagnosticCode::SqlUnknownColumn,
                                Severity::Error,
                                format!(
                                    "Column '{}' does not appear in any table referenced \
                                     by the query",
                                    reference.column
                                ),
                            )
                            .with_comparison(available, reference.column.clone()),
                        );
                    }
                }
            }
        }

        diagnostics
    }
}

/// Everything name-like collected from one statement, across all nesting
/// levels. A single flat scope is enough here: false negatives from
/// cross-level leakage are caught by EXPLAIN, while a false positive
/// would burn a retry on a correct query.
#[derive(Default)]
struct QueryScope {
    /// Base table references as written, possibly schema-qualified
    relations: Vec<String>,
    /// FROM alias (lowercased) to relation name
    aliases: HashMap<String, String>,
    /// Names introduced by the query itself: CTEs and derived-table
    /// aliases (lowercased)
    synthetic: HashSet<String>,
    /// SELECT-list aliases (lowercased), legal in GROUP BY and ORDER BY
    output_aliases: HashSet<String>,
    /// Column references: optional qualifier plus column name
    columns: Vec<ColumnUse>,
}

struct ColumnUse {
    qualifier: Option<String>,
    column: String,
}

impl QueryScope {
    fn push_column(&mut self, qualifier: Option<String>, column: String) {
        self.columns.push(ColumnUse { qualifier, column });
    }

    fn push_qualified_wildcard(&mut self, name: &ObjectName) {
        if let Some(ident) = name.0.last() {
            self.push_column(Some(ident.value.clone()), "*".to_string());
        }
    }
}

fn last_part(relation: &str) -> &str {
    relation.rsplit('.').next().unwrap_or(relation)
}

fn object_name_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

fn collect_query(query: &Query, scope: &mut QueryScope) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            scope.synthetic.insert(cte.alias.name.value.to_lowercase());
            collect_query(&cte.query, scope);
        }
    }
    collect_set_expr(&query.body, scope);
    if let Some(order_by) = &query.order_by {
        for order in &order_by.exprs {
            collect_expr(&order.expr, scope);
        }
    }
}

fn collect_set_expr(body: &SetExpr, scope: &mut QueryScope) {
    match body {
        SetExpr::Select(select) => collect_select(select, scope),
        SetExpr::Query(query) => collect_query(query, scope),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr(left, scope);
            collect_set_expr(right, scope);
        }
        _ => {}
    }
}

fn collect_select(select: &Select, scope: &mut QueryScope) {
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) => collect_expr(expr, scope),
            SelectItem::ExprWithAlias { expr, alias } => {
                collect_expr(expr, scope);
                scope.output_aliases.insert(alias.value.to_lowercase());
            }
            SelectItem::QualifiedWildcard(name, _) => scope.push_qualified_wildcard(name),
            SelectItem::Wildcard(_) => {}
        }
    }
    for table in &select.from {
        collect_table_with_joins(table, scope);
    }
    if let Some(selection) = &select.selection {
        collect_expr(selection, scope);
    }
    if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
        for expr in exprs {
            collect_expr(expr, scope);
        }
    }
    if let Some(having) = &select.having {
        collect_expr(having, scope);
    }
}

fn collect_table_with_joins(table: &TableWithJoins, scope: &mut QueryScope) {
    collect_table_factor(&table.relation, scope);
    for join in &table.joins {
        collect_table_factor(&join.relation, scope);
        match &join.join_operator {
            JoinOperator::Inner(constraint)
            | JoinOperator::LeftOuter(constraint)
            | JoinOperator::RightOuter(constraint)
            | JoinOperator::FullOuter(constraint)
            | JoinOperator::LeftSemi(constraint)
            | JoinOperator::RightSemi(constraint)
            | JoinOperator::LeftAnti(constraint)
            | JoinOperator::RightAnti(constraint) => match constraint {
                JoinConstraint::On(expr) => collect_expr(expr, scope),
                JoinConstraint::Using(columns) => {
                    for column in columns {
                        scope.push_column(None, column.value.clone());
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

fn collect_table_factor(factor: &TableFactor, scope: &mut QueryScope) {
    match factor {
        TableFactor::Table {
            name, alias, args, ..
        } => {
            if args.is_some() {
                // Table-valued function, not a base relation.
                if let Some(alias) = alias {
                    scope.synthetic.insert(alias.name.value.to_lowercase());
                }
                return;
            }
            let relation = object_name_string(name);
            if let Some(alias) = alias {
                scope
                    .aliases
                    .insert(alias.name.value.to_lowercase(), last_part(&relation).to_string());
            }
            scope.relations.push(relation);
        }
        TableFactor::Derived {
            subquery, alias, ..
        } => {
            collect_query(subquery, scope);
            if let Some(alias) = alias {
                scope.synthetic.insert(alias.name.value.to_lowercase());
            } else {
                // An anonymous derived table still suppresses strict
                // bare-column checking.
                scope.synthetic.insert(String::new());
            }
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            collect_table_with_joins(table_with_joins, scope);
        }
        _ => {}
    }
}

fn collect_expr(expr: &Expr, scope: &mut QueryScope) {
    match expr {
        Expr::Identifier(ident) => scope.push_column(None, ident.value.clone()),
        Expr::CompoundIdentifier(idents) => {
            if idents.len() >= 2 {
                let qualifier = idents[idents.len() - 2].value.clone();
                let column = idents[idents.len() - 1].value.clone();
                scope.push_column(Some(qualifier), column);
            } else if let Some(ident) = idents.first() {
                scope.push_column(None, ident.value.clone());
            }
        }
        Expr::QualifiedWildcard(name, ..) => scope.push_qualified_wildcard(name),
        Expr::BinaryOp { left, right, .. } => {
            collect_expr(left, scope);
            collect_expr(right, scope);
        }
        Expr::UnaryOp { expr, .. } => collect_expr(expr, scope),
        Expr::Cast { expr, .. } => collect_expr(expr, scope),
        Expr::Nested(inner) => collect_expr(inner, scope),
        Expr::IsNull(inner)
        | Expr::IsNotNull(inner)
        | Expr::IsTrue(inner)
        | Expr::IsNotTrue(inner)
        | Expr::IsFalse(inner)
        | Expr::IsNotFalse(inner)
        | Expr::IsUnknown(inner)
        | Expr::IsNotUnknown(inner) => collect_expr(inner, scope),
        Expr::IsDistinctFrom(left, right) | Expr::IsNotDistinctFrom(left, right) => {
            collect_expr(left, scope);
            collect_expr(right, scope);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_expr(expr, scope);
            collect_expr(low, scope);
            collect_expr(high, scope);
        }
        Expr::InList { expr, list, .. } => {
            collect_expr(expr, scope);
            for item in list {
                collect_expr(item, scope);
            }
        }
        Expr::InSubquery { expr, subquery, .. } => {
            collect_expr(expr, scope);
            collect_query(subquery, scope);
        }
        Expr::Subquery(subquery) => collect_query(subquery, scope),
        Expr::Exists { subquery, .. } => collect_query(subquery, scope),
        Expr::Case {
            operand,
            conditions,
            results,
            else_result,
            ..
        } => {
            if let Some(operand) = operand {
                collect_expr(operand, scope);
            }
            for condition in conditions {
                collect_expr(condition, scope);
            }
            for result in results {
                collect_expr(result, scope);
            }
            if let Some(else_result) = else_result {
                collect_expr(else_result, scope);
            }
        }
        Expr::Function(func) => {
            match &func.args {
                FunctionArguments::List(list) => {
                    for arg in &list.args {
                        let arg_expr = match arg {
                            FunctionArg::Unnamed(arg_expr) => arg_expr,
                            FunctionArg::Named { arg, .. } => arg,
                            FunctionArg::ExprNamed { arg, .. } => arg,
                        };
                        match arg_expr {
                            FunctionArgExpr::Expr(inner) => collect_expr(inner, scope),
                            FunctionArgExpr::QualifiedWildcard(name) => {
                                scope.push_qualified_wildcard(name)
                            }
                            FunctionArgExpr::Wildcard => {}
                        }
                    }
                }
                FunctionArguments::Subquery(subquery) => collect_query(subquery, scope),
                FunctionArguments::None => {}
            }
            if let Some(filter) = &func.filter {
                collect_expr(filter, scope);
            }
            if let Some(WindowType::WindowSpec(spec)) = &func.over {
                for expr in &spec.partition_by {
                    collect_expr(expr, scope);
                }
                for order in &spec.order_by {
                    collect_expr(&order.expr, scope);
                }
            }
        }
        Expr::Like { expr, pattern, .. }
        | Expr::ILike { expr, pattern, .. }
        | Expr::SimilarTo { expr, pattern, .. } => {
            collect_expr(expr, scope);
            collect_expr(pattern, scope);
        }
        Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            collect_expr(left, scope);
            collect_expr(right, scope);
        }
        Expr::Tuple(exprs) => {
            for inner in exprs {
                collect_expr(inner, scope);
            }
        }
        Expr::Extract { expr, .. } => collect_expr(expr, scope),
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            collect_expr(expr, scope);
            if let Some(from) = substring_from {
                collect_expr(from, scope);
            }
            if let Some(length) = substring_for {
                collect_expr(length, scope);
            }
        }
        Expr::Trim {
            expr, trim_what, ..
        } => {
            collect_expr(expr, scope);
            if let Some(what) = trim_what {
                collect_expr(what, scope);
            }
        }
        Expr::Floor { expr, .. } | Expr::Ceil { expr, .. } => collect_expr(expr, scope),
        Expr::Position { expr, r#in, .. } => {
            collect_expr(expr, scope);
            collect_expr(r#in, scope);
        }
        _ => {}
    }
}
