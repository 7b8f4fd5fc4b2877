use crate::{
    catalog::FieldType,
    guard::RejectReason,
    value::ValueFamily,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error surface returned by the query session. Each variant wraps
/// the structured error owned by one pipeline stage, so callers can branch
/// on kind without parsing messages. Storage internals (connection strings,
/// backend traces) never appear in any message.
///

#[derive(Clone, Debug, ThisError)]
pub enum Error {
    #[error("{0}")]
    Validate(#[from] ValidateError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("query rejected: {0}")]
    Guardrail(RejectReason),

    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Stable machine-readable kind label, recorded in the audit outcome.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validate(err) => err.kind(),
            Self::Compile(err) => err.kind(),
            Self::Guardrail(reason) => reason.kind(),
            Self::Storage(err) => err.kind(),
        }
    }
}

///
/// ValidateError
///
/// Intent validation failures. The caller's structured intent was malformed;
/// never retried, always audited with the rejection reason.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("unknown entity '{name}'")]
    UnknownEntity { name: String },

    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("field '{field}' on entity '{entity}' is not queryable")]
    FieldNotQueryable { entity: String, field: String },

    #[error("field '{field}' on entity '{entity}' is not groupable")]
    FieldNotGroupable { entity: String, field: String },

    #[error("unknown relation '{relation}' on entity '{entity}'")]
    UnknownRelation { entity: String, relation: String },

    #[error("filter path '{path}' exceeds the one-hop join limit")]
    UnsupportedJoinDepth { path: String },

    #[error("operator '{op}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, op: String },

    #[error("unknown aggregation kind '{kind}'")]
    UnsupportedAggregation { kind: String },

    #[error("aggregation '{kind}' requires a target field")]
    AggregationFieldMissing { kind: String },

    #[error("field '{field}' on entity '{entity}' is not aggregatable")]
    FieldNotAggregatable { entity: String, field: String },

    #[error("too many groupBy fields: {found} (max {max})")]
    TooManyGroupByFields { found: usize, max: usize },

    #[error("literal for field '{field}' has type {found}, expected {expected}")]
    LiteralTypeMismatch {
        field: String,
        expected: FieldType,
        found: ValueFamily,
    },

    #[error("malformed literal for field '{field}': {detail}")]
    MalformedLiteral { field: String, detail: String },

    #[error("time range is not applicable to entity '{entity}'")]
    TimeRangeNotApplicable { entity: String },
}

impl ValidateError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownEntity { .. } => "unknown_entity",
            Self::UnknownField { .. } => "unknown_field",
            Self::FieldNotQueryable { .. } => "field_not_queryable",
            Self::FieldNotGroupable { .. } => "field_not_groupable",
            Self::UnknownRelation { .. } => "unknown_relation",
            Self::UnsupportedJoinDepth { .. } => "unsupported_join_depth",
            Self::UnsupportedOperator { .. } => "unsupported_operator",
            Self::UnsupportedAggregation { .. } => "unsupported_aggregation",
            Self::AggregationFieldMissing { .. } => "aggregation_field_missing",
            Self::FieldNotAggregatable { .. } => "field_not_aggregatable",
            Self::TooManyGroupByFields { .. } => "too_many_group_by_fields",
            Self::LiteralTypeMismatch { .. } => "literal_type_mismatch",
            Self::MalformedLiteral { .. } => "malformed_literal",
            Self::TimeRangeNotApplicable { .. } => "time_range_not_applicable",
        }
    }
}

///
/// CompileError
///
/// Plan construction failures. `MissingTenantScope` is security-relevant
/// and is never silently defaulted.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("missing tenant scope: every query must carry a municipality")]
    MissingTenantScope,

    #[error("plan too complex: {joins} joined relations (max {max})")]
    PlanTooComplex { joins: usize, max: usize },
}

impl CompileError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingTenantScope => "missing_tenant_scope",
            Self::PlanTooComplex { .. } => "plan_too_complex",
        }
    }
}

///
/// StorageError
///
/// Failures raised at the storage boundary. Surfaced to the caller for
/// their own retry decision; never retried inside the adapter.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage call exceeded the {timeout_ms}ms execution budget")]
    Timeout { timeout_ms: u64 },

    #[error("query cancelled by the caller")]
    Cancelled,
}

impl StorageError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable => "storage_unavailable",
            Self::Timeout { .. } => "storage_timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// True if the caller may reasonably retry with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

///
/// AuditWriteError
///
/// Failure to persist an audit record. Logged as an operator warning and
/// never propagated to the query caller.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("audit write failed: {message}")]
pub struct AuditWriteError {
    pub message: String,
}

impl AuditWriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
