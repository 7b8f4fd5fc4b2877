mod fingerprint;

pub use fingerprint::PlanFingerprint;

use crate::{
    catalog::Entity,
    intent::{AggregateKind, FieldPath},
    value::Value,
};
use std::fmt;

///
/// PlanOp
///
/// Comparison operators as storage backends see them. `between` never
/// reaches this layer; the compiler lowers it to a `Gte`/`Lte` pair so
/// backends only implement the simple set.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
    StartsWith,
}

impl PlanOp {
    /// Token used in the readable query text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "IN",
            Self::Contains => "CONTAINS",
            Self::StartsWith => "STARTS WITH",
        }
    }
}

impl fmt::Display for PlanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

///
/// PredicateOrigin
///
/// Who contributed a predicate. The tenant-scope predicate is appended by
/// the compiler from the authorization context and is the only one with
/// `TenantScope` origin; user filters can never carry or displace it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PredicateOrigin {
    User,
    TenantScope,
    TimeRange,
}

///
/// WherePredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct WherePredicate {
    pub path: FieldPath,
    pub op: PlanOp,
    pub value: Value,
    pub origin: PredicateOrigin,
}

///
/// WhereClause
///
/// Structured conjunction. Predicates are parameterized; no literal is ever
/// concatenated into an executable string.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WhereClause {
    pub predicates: Vec<WherePredicate>,
}

impl WhereClause {
    /// The mandatory tenant-scope predicate.
    #[must_use]
    pub fn tenant_predicate(&self) -> Option<&WherePredicate> {
        self.predicates
            .iter()
            .find(|predicate| predicate.origin == PredicateOrigin::TenantScope)
    }

    /// Predicates contributed by the caller's filters.
    pub fn user_predicates(&self) -> impl Iterator<Item = &WherePredicate> {
        self.predicates
            .iter()
            .filter(|predicate| predicate.origin == PredicateOrigin::User)
    }
}

///
/// AggregateClause
///

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateClause {
    pub kind: AggregateKind,
    pub field: String,
}

impl AggregateClause {
    /// Name of the output column carrying this aggregate in result rows.
    #[must_use]
    pub fn output_column(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.field)
    }
}

///
/// OrderSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderSpec {
    pub field: String,
    pub direction: OrderDirection,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

///
/// JoinPath
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinPath {
    pub relation: String,
    pub target: Entity,
}

///
/// CompiledPlan
///
/// Safe, bounded, executable form of an intent. Fully deterministic given
/// an intent and catalog version: no randomness, no clock reads. The
/// readable text embeds escaped, truncated literals for audit display only;
/// execution consumes the structured clauses.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPlan {
    pub entity: Entity,
    pub select: Vec<String>,
    pub where_clause: WhereClause,
    pub group_by: Vec<String>,
    pub aggregate: Option<AggregateClause>,
    pub order_by: OrderSpec,
    pub limit: u32,
    pub joins: Vec<JoinPath>,
    /// Dataset names the plan touches, base entity first, joins in
    /// declaration order. Copied verbatim into the audit record.
    pub datasets: Vec<String>,
    pub readable_query_text: String,
}

impl CompiledPlan {
    /// True when the plan computes an aggregate (grouped or scalar).
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }
}
