
use crate::{
    catalog::Entity,
    error::StorageError,
    plan::{AggregateClause, CompiledPlan, OrderSpec, WhereClause},
    value::Value,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

///
/// Row
///
/// One result row: field name → literal. Flat reads carry the selected
/// entity fields; grouped aggregates carry the grouping dimensions plus the
/// aggregate's output column.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

///
/// ReadRequest
///
/// Structured arguments for a filtered read. Borrowed straight from the
/// plan; no query strings ever cross this boundary.
///

#[derive(Clone, Copy, Debug)]
pub struct ReadRequest<'a> {
    pub entity: Entity,
    pub where_clause: &'a WhereClause,
    pub select: &'a [String],
    pub order_by: &'a OrderSpec,
    pub limit: u32,
    /// Remaining execution budget; backends that can should give up once
    /// it is spent.
    pub timeout: Duration,
}

///
/// AggregateRequest
///

#[derive(Clone, Copy, Debug)]
pub struct AggregateRequest<'a> {
    pub entity: Entity,
    pub where_clause: &'a WhereClause,
    pub group_by: &'a [String],
    pub aggregate: &'a AggregateClause,
    pub order_by: &'a OrderSpec,
    pub limit: u32,
    pub timeout: Duration,
}

///
/// Storage
///
/// The swappable data-access capability this core executes against.
/// Implementations own connection lifecycle and are injected at
/// construction; the engine never reaches for a global client.
///

pub trait Storage: Send + Sync {
    fn filtered_read(&self, request: &ReadRequest<'_>) -> Result<Vec<Row>, StorageError>;

    fn aggregate(&self, request: &AggregateRequest<'_>) -> Result<Vec<Row>, StorageError>;
}

///
/// ExecutionResult
///

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult {
    pub rows: Vec<Row>,
    pub row_count: u64,
    /// Wall-clock time spent inside the storage call only; compile and
    /// guardrail time is excluded.
    pub elapsed_ms: u64,
}

///
/// ExecutionAdapter
///
/// Runs a plan against storage, measuring latency around the storage call.
/// No retries happen here: `Unavailable` is retryable by the caller with
/// backoff, `Timeout` is surfaced so slow queries stay visible, and
/// `Cancelled` is recorded rather than masked.
///

#[derive(Clone)]
pub struct ExecutionAdapter {
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl ExecutionAdapter {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Execute a guardrail-approved plan.
    pub fn execute(&self, plan: &CompiledPlan) -> Result<ExecutionResult, StorageError> {
        let started = Instant::now();

        let rows = match &plan.aggregate {
            Some(aggregate) => self.storage.aggregate(&AggregateRequest {
                entity: plan.entity,
                where_clause: &plan.where_clause,
                group_by: &plan.group_by,
                aggregate,
                order_by: &plan.order_by,
                limit: plan.limit,
                timeout: self.timeout,
            }),
            None => self.storage.filtered_read(&ReadRequest {
                entity: plan.entity,
                where_clause: &plan.where_clause,
                select: &plan.select,
                order_by: &plan.order_by,
                limit: plan.limit,
                timeout: self.timeout,
            }),
        }?;

        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            // A result that arrives after the budget still counts as a
            // timeout; anything else would hide slow-query problems.
            return Err(StorageError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        let row_count = rows.len() as u64;
        Ok(ExecutionResult {
            rows,
            row_count,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

impl std::fmt::Debug for ExecutionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionAdapter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
