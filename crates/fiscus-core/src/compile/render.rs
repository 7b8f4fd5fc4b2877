//! Readable query text for audit display.
//!
//! This rendering is never executed. Literals are escaped and truncated
//! before embedding so a crafted filter value cannot inject text into audit
//! records or grow them without bound. The structured clauses on the plan
//! are the only thing storage backends consume.

use crate::{
    plan::{CompiledPlan, WherePredicate},
    value::Value,
};
use std::fmt::Write;

/// Render a deterministic, SQL-flavoured description of the plan.
pub(crate) fn readable_text(plan: &CompiledPlan, literal_max_chars: usize) -> String {
    let mut text = String::with_capacity(128);

    text.push_str("SELECT ");
    match &plan.aggregate {
        Some(aggregate) => {
            for field in &plan.group_by {
                text.push_str(field);
                text.push_str(", ");
            }
            let _ = write!(text, "{}({})", aggregate.kind, aggregate.field);
        }
        None => text.push('*'),
    }

    let _ = write!(text, " FROM {}", plan.entity);

    for join in &plan.joins {
        let _ = write!(text, " JOIN {} AS {}", join.target, join.relation);
    }

    for (i, predicate) in plan.where_clause.predicates.iter().enumerate() {
        text.push_str(if i == 0 { " WHERE " } else { " AND " });
        render_predicate(&mut text, predicate, literal_max_chars);
    }

    if !plan.group_by.is_empty() {
        text.push_str(" GROUP BY ");
        text.push_str(&plan.group_by.join(", "));
    }

    let _ = write!(
        text,
        " ORDER BY {} {} LIMIT {}",
        plan.order_by.field,
        plan.order_by.direction.as_str(),
        plan.limit
    );

    text
}

fn render_predicate(text: &mut String, predicate: &WherePredicate, max_chars: usize) {
    let _ = write!(text, "{} {} ", predicate.path, predicate.op);
    render_value(text, &predicate.value, max_chars);
}

fn render_value(text: &mut String, value: &Value, max_chars: usize) {
    match value {
        Value::Null => text.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(text, "{b}");
        }
        Value::Int(n) => {
            let _ = write!(text, "{n}");
        }
        Value::Decimal(d) => {
            let _ = write!(text, "{d}");
        }
        Value::Date(d) => {
            let _ = write!(text, "'{d}'");
        }
        Value::Text(s) => {
            text.push('\'');
            text.push_str(&escape_literal(s, max_chars));
            text.push('\'');
        }
        Value::List(items) => {
            text.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    text.push_str(", ");
                }
                render_value(text, item, max_chars);
            }
            text.push(')');
        }
    }
}

/// Truncate to `max_chars`, drop control characters, and double any single
/// quotes so the literal cannot break out of its quoting.
fn escape_literal(raw: &str, max_chars: usize) -> String {
    let mut escaped = String::with_capacity(raw.len().min(max_chars) + 2);
    for ch in raw.chars().filter(|ch| !ch.is_control()).take(max_chars) {
        if ch == '\'' {
            escaped.push('\'');
        }
        escaped.push(ch);
    }
    escaped
}
