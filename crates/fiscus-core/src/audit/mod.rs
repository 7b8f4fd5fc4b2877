
use crate::{
    chart::ChartSpec,
    error::AuditWriteError,
    exec::ExecutionResult,
    plan::CompiledPlan,
};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::Serialize;
use std::sync::Arc;
use ulid::Ulid;

///
/// QueryAuditId
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
pub struct QueryAuditId(Ulid);

impl QueryAuditId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

///
/// AuditOutcome
///
/// How the query lifecycle ended. Serialized into the audit record so
/// rejected and failed attempts are as analysable as completed ones.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AuditOutcome {
    Completed,
    Rejected { reason: String },
    Failed { kind: String },
    Cancelled,
}

///
/// QueryAudit
///
/// One immutable provenance record per query lifecycle. Flat on purpose:
/// datasets are referenced by name, not id, so the record stays meaningful
/// after dataset renames or deletions. Created exactly once, never mutated.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAudit {
    pub id: QueryAuditId,
    pub user_type: String,
    pub nl_query: Option<String>,
    pub compiled_query: Option<String>,
    pub chart_spec: Option<serde_json::Value>,
    pub filters_json: Option<serde_json::Value>,
    pub datasets_used: Vec<String>,
    pub rows_returned: Option<u64>,
    pub latency_ms: Option<u64>,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
}

///
/// AuditSink
///
/// Append-only persistence for audit records. Implementations must not
/// update or delete; each concurrent query appends its own row with no
/// coordination.
///

pub trait AuditSink: Send + Sync {
    fn append(&self, record: &QueryAudit) -> Result<(), AuditWriteError>;
}

///
/// AuditDraft
///
/// Everything the recorder needs from one query lifecycle. Fields are
/// optional because partial records are valid and expected: a rejected or
/// failed query has no rows, latency, or chart.
///

#[derive(Clone, Debug)]
pub struct AuditDraft<'a> {
    pub user_type: &'a str,
    pub nl_query: Option<&'a str>,
    pub plan: Option<&'a CompiledPlan>,
    pub filters_json: Option<serde_json::Value>,
    pub chart_spec: Option<&'a ChartSpec>,
    pub execution: Option<&'a ExecutionResult>,
    pub outcome: AuditOutcome,
}

///
/// AuditRecorder
///
/// Sole writer of audit records. A sink failure is logged as an operator
/// warning and never propagated: observability must not degrade
/// availability, so the caller still gets their result (and the generated
/// audit id) either way.
///

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Build and append exactly one record for a finished lifecycle.
    pub fn record(&self, draft: AuditDraft<'_>) -> QueryAuditId {
        let id = QueryAuditId::generate();

        let record = QueryAudit {
            id,
            user_type: draft.user_type.to_string(),
            nl_query: draft.nl_query.map(ToString::to_string),
            compiled_query: draft.plan.map(|plan| plan.readable_query_text.clone()),
            chart_spec: draft
                .chart_spec
                .and_then(|spec| serde_json::to_value(spec).ok()),
            filters_json: draft.filters_json,
            datasets_used: draft.plan.map(|plan| plan.datasets.clone()).unwrap_or_default(),
            rows_returned: draft.execution.map(|result| result.row_count),
            latency_ms: draft.execution.map(|result| result.elapsed_ms),
            outcome: draft.outcome,
            timestamp: Utc::now(),
        };

        if let Err(err) = self.sink.append(&record) {
            tracing::warn!(audit_id = %id, error = %err, "audit write failed; result returned anyway");
        }

        id
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder").finish_non_exhaustive()
    }
}
