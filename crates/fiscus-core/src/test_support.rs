//! In-memory fixtures: a seeded storage backend and audit sinks.
//!
//! The storage fake evaluates structured plans the way a real backend
//! would (predicate conjunction, one-hop relation lookups, grouping, exact
//! decimal aggregation) so lifecycle tests see realistic result shapes
//! without a database.

use crate::{
    audit::{AuditSink, QueryAudit},
    catalog::{Catalog, Entity},
    error::{AuditWriteError, StorageError},
    exec::{AggregateRequest, ReadRequest, Row, Storage},
    intent::{AggregateKind, FieldPath},
    plan::{OrderDirection, OrderSpec, PlanOp, WhereClause, WherePredicate},
    value::Value,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn money(s: &str) -> Value {
    Value::Decimal(s.parse().expect("fixture decimal"))
}

fn date(s: &str) -> Value {
    Value::Date(s.parse().expect("fixture date"))
}

///
/// MemoryStorage
///
/// Deterministic storage fake seeded with two municipalities' finance data.
///

pub(crate) struct MemoryStorage {
    catalog: Catalog,
    tables: BTreeMap<Entity, Vec<Row>>,
}

impl MemoryStorage {
    pub fn seeded() -> Self {
        let mut tables: BTreeMap<Entity, Vec<Row>> = BTreeMap::new();

        tables.insert(
            Entity::Supplier,
            vec![
                Row::new()
                    .with("id", text("s-1"))
                    .with("name", text("Obras del Norte"))
                    .with("sector", text("construction"))
                    .with("locality", text("Centro")),
                Row::new()
                    .with("id", text("s-2"))
                    .with("name", text("Eventos Rivera"))
                    .with("sector", text("catering"))
                    .with("locality", text("Sur")),
            ],
        );

        tables.insert(
            Entity::FiscalYear,
            vec![
                Row::new()
                    .with("id", text("FY2023"))
                    .with("year", Value::Int(2023))
                    .with("status", text("closed")),
                Row::new()
                    .with("id", text("FY2024"))
                    .with("year", Value::Int(2024))
                    .with("status", text("open")),
            ],
        );

        let expenditure = |id: &str, mun: &str, fy: &str, day: &str, dept: &str, amount: &str,
                           supplier: &str| {
            Row::new()
                .with("id", text(id))
                .with("municipalityId", text(mun))
                .with("fiscalYearId", text(fy))
                .with("date", date(day))
                .with("department", text(dept))
                .with("category", text("services"))
                .with("amountActual", money(amount))
                .with("currency", text("EUR"))
                .with("supplierId", text(supplier))
        };
        tables.insert(
            Entity::Expenditure,
            vec![
                expenditure("e-1", "mun-001", "FY2024", "2024-02-10", "Parks", "100.50", "s-1"),
                expenditure("e-2", "mun-001", "FY2024", "2024-03-05", "Parks", "200.25", "s-1"),
                expenditure("e-3", "mun-001", "FY2024", "2024-03-20", "Culture", "75.00", "s-2"),
                expenditure("e-4", "mun-001", "FY2023", "2023-11-30", "Parks", "50.00", "s-1"),
                expenditure("e-5", "mun-002", "FY2024", "2024-02-14", "Parks", "999.99", "s-1"),
            ],
        );

        tables.insert(
            Entity::Budget,
            vec![
                Row::new()
                    .with("id", text("b-1"))
                    .with("municipalityId", text("mun-001"))
                    .with("fiscalYearId", text("FY2024"))
                    .with("department", text("Parks"))
                    .with("amountPlanned", money("500.00"))
                    .with("currency", text("EUR")),
            ],
        );

        Self {
            catalog: Catalog::global(),
            tables,
        }
    }

    fn rows(&self, entity: Entity) -> &[Row] {
        self.tables.get(&entity).map_or(&[], Vec::as_slice)
    }

    /// Resolve a predicate path against a row, following one relation hop
    /// through the target table's primary key.
    fn resolve_value<'a>(&'a self, entity: Entity, row: &'a Row, path: &FieldPath) -> Option<&'a Value> {
        match path {
            FieldPath::Local(field) => row.get(field),
            FieldPath::Related { relation, field } => {
                let relation = self.catalog.describe(entity).relation(relation)?;
                let fk = row.get(relation.local_field)?;
                self.rows(relation.target)
                    .iter()
                    .find(|candidate| candidate.get("id").is_some_and(|id| id.canonical_eq(fk)))
                    .and_then(|candidate| candidate.get(field))
            }
        }
    }

    fn matches(&self, entity: Entity, row: &Row, clause: &WhereClause) -> bool {
        clause
            .predicates
            .iter()
            .all(|predicate| self.eval(entity, row, predicate))
    }

    fn eval(&self, entity: Entity, row: &Row, predicate: &WherePredicate) -> bool {
        let Some(actual) = self.resolve_value(entity, row, &predicate.path) else {
            return false;
        };
        match predicate.op {
            PlanOp::Eq => actual.canonical_eq(&predicate.value),
            PlanOp::Ne => !actual.canonical_eq(&predicate.value),
            PlanOp::Lt => actual.canonical_cmp(&predicate.value) == Some(Ordering::Less),
            PlanOp::Lte => matches!(
                actual.canonical_cmp(&predicate.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            PlanOp::Gt => actual.canonical_cmp(&predicate.value) == Some(Ordering::Greater),
            PlanOp::Gte => matches!(
                actual.canonical_cmp(&predicate.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            PlanOp::In => match &predicate.value {
                Value::List(items) => items.iter().any(|item| actual.canonical_eq(item)),
                _ => false,
            },
            PlanOp::Contains => match (actual, &predicate.value) {
                (Value::Text(haystack), Value::Text(needle)) => haystack.contains(needle),
                _ => false,
            },
            PlanOp::StartsWith => match (actual, &predicate.value) {
                (Value::Text(haystack), Value::Text(needle)) => haystack.starts_with(needle),
                _ => false,
            },
        }
    }

    fn sort(rows: &mut [Row], order: &OrderSpec) {
        rows.sort_by(|a, b| {
            let ordering = match (a.get(&order.field), b.get(&order.field)) {
                (Some(left), Some(right)) => {
                    left.canonical_cmp(right).unwrap_or(Ordering::Equal)
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
    }
}

impl Storage for MemoryStorage {
    fn filtered_read(&self, request: &ReadRequest<'_>) -> Result<Vec<Row>, StorageError> {
        let mut rows: Vec<Row> = self
            .rows(request.entity)
            .iter()
            .filter(|row| self.matches(request.entity, row, request.where_clause))
            .map(|row| {
                let mut projected = Row::new();
                for field in request.select {
                    if let Some(value) = row.get(field) {
                        projected.set(field.clone(), value.clone());
                    }
                }
                projected
            })
            .collect();

        Self::sort(&mut rows, request.order_by);
        rows.truncate(request.limit as usize);
        Ok(rows)
    }

    fn aggregate(&self, request: &AggregateRequest<'_>) -> Result<Vec<Row>, StorageError> {
        let matched: Vec<&Row> = self
            .rows(request.entity)
            .iter()
            .filter(|row| self.matches(request.entity, row, request.where_clause))
            .collect();

        let mut groups: BTreeMap<Vec<String>, Vec<&Row>> = BTreeMap::new();
        for row in matched {
            let key = request
                .group_by
                .iter()
                .map(|field| row.get(field).map_or_else(String::new, ToString::to_string))
                .collect();
            groups.entry(key).or_default().push(row);
        }

        let output_column = request.aggregate.output_column();
        let mut rows = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            let mut row = Row::new();
            for (field, label) in request.group_by.iter().zip(key) {
                row.set(field.clone(), Value::Text(label));
            }

            let amounts: Vec<Decimal> = members
                .iter()
                .filter_map(|member| member.get(&request.aggregate.field))
                .filter_map(Value::as_decimal)
                .collect();
            let value = match request.aggregate.kind {
                AggregateKind::Count => Value::Int(amounts.len() as i64),
                AggregateKind::Sum => Value::Decimal(amounts.iter().sum()),
                AggregateKind::Avg => {
                    if amounts.is_empty() {
                        Value::Null
                    } else {
                        let sum: Decimal = amounts.iter().sum();
                        Value::Decimal(sum / Decimal::from(amounts.len() as u64))
                    }
                }
                AggregateKind::Min => amounts.iter().min().copied().map_or(Value::Null, Value::Decimal),
                AggregateKind::Max => amounts.iter().max().copied().map_or(Value::Null, Value::Decimal),
                AggregateKind::None => Value::Null,
            };
            row.set(output_column.clone(), value);
            rows.push(row);
        }

        Self::sort(&mut rows, request.order_by);
        rows.truncate(request.limit as usize);
        Ok(rows)
    }
}

///
/// FlakyStorage
/// Always fails with the scripted error.
///

pub(crate) struct FlakyStorage {
    pub error: StorageError,
}

impl Storage for FlakyStorage {
    fn filtered_read(&self, _request: &ReadRequest<'_>) -> Result<Vec<Row>, StorageError> {
        Err(self.error.clone())
    }

    fn aggregate(&self, _request: &AggregateRequest<'_>) -> Result<Vec<Row>, StorageError> {
        Err(self.error.clone())
    }
}

///
/// MemoryAuditSink
///

#[derive(Default)]
pub(crate) struct MemoryAuditSink {
    records: Mutex<Vec<QueryAudit>>,
}

impl MemoryAuditSink {
    pub fn records(&self) -> Vec<QueryAudit> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &QueryAudit) -> Result<(), AuditWriteError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

///
/// FailingAuditSink
///

pub(crate) struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn append(&self, _record: &QueryAudit) -> Result<(), AuditWriteError> {
        Err(AuditWriteError::new("sink offline"))
    }
}
