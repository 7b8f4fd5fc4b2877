
use crate::{
    catalog::{Catalog, FieldDescriptor, FieldType},
    compile::render,
    config::RuntimeConfig,
    intent::FieldPath,
    plan::CompiledPlan,
    value::{Value, ValueFamily},
};
use thiserror::Error as ThisError;

///
/// RejectReason
///
/// Machine-readable guardrail verdicts. Rejected plans are still audited,
/// so each reason carries enough detail to analyse the attempt later.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum RejectReason {
    #[error("plan joins {joins} relations (max {max})")]
    PlanTooComplex { joins: usize, max: usize },

    #[error("aggregate plan requests raw field selection: {fields:?}")]
    RawSelectionWithAggregate { fields: Vec<String> },

    #[error("plan references unresolvable field '{path}'")]
    UnresolvedField { path: String },

    #[error("literal for '{field}' has type {found}, field is declared {expected}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: ValueFamily,
    },
}

impl RejectReason {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlanTooComplex { .. } => "plan_too_complex",
            Self::RawSelectionWithAggregate { .. } => "raw_selection_with_aggregate",
            Self::UnresolvedField { .. } => "unresolved_field",
            Self::TypeMismatch { .. } => "type_mismatch",
        }
    }
}

///
/// Rejection
///
/// A refused plan, shape preserved for the audit record.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub plan: CompiledPlan,
}

///
/// Guardrails
///
/// Last line of defense between the compiler and storage. Pure: clamps
/// where safe (limit), rejects where not, and re-checks literal types even
/// though validation already did, so a bug upstream cannot become an
/// unbounded or ill-typed read.
///

#[derive(Clone, Copy, Debug)]
pub struct Guardrails {
    catalog: Catalog,
    max_limit: u32,
    max_joins: usize,
    literal_max_chars: usize,
}

impl Guardrails {
    #[must_use]
    pub const fn new(catalog: Catalog, config: &RuntimeConfig) -> Self {
        Self {
            catalog,
            max_limit: config.max_limit,
            max_joins: config.max_joins,
            literal_max_chars: config.literal_max_chars,
        }
    }

    /// Enforce hard limits on a compiled plan, in order: limit clamp, join
    /// ceiling, aggregate/selection discipline, literal type agreement.
    pub fn enforce(&self, mut plan: CompiledPlan) -> Result<CompiledPlan, Rejection> {
        if plan.limit > self.max_limit {
            plan.limit = self.max_limit;
            plan.readable_query_text = render::readable_text(&plan, self.literal_max_chars);
        }

        if plan.joins.len() > self.max_joins {
            let reason = RejectReason::PlanTooComplex {
                joins: plan.joins.len(),
                max: self.max_joins,
            };
            return Err(Rejection { reason, plan });
        }

        if let Err(reason) = self.check_selection(&plan) {
            return Err(Rejection { reason, plan });
        }

        if let Err(reason) = self.check_literal_types(&plan) {
            return Err(Rejection { reason, plan });
        }

        Ok(plan)
    }

    /// An aggregate plan may select its grouping dimensions and nothing
    /// else; a scalar aggregate selects nothing. Anything wider is a
    /// full-table dump disguised as an aggregate.
    fn check_selection(&self, plan: &CompiledPlan) -> Result<(), RejectReason> {
        if plan.aggregate.is_none() {
            return Ok(());
        }

        let extra: Vec<String> = plan
            .select
            .iter()
            .filter(|field| !plan.group_by.contains(field))
            .cloned()
            .collect();
        if extra.is_empty() {
            Ok(())
        } else {
            Err(RejectReason::RawSelectionWithAggregate { fields: extra })
        }
    }

    fn check_literal_types(&self, plan: &CompiledPlan) -> Result<(), RejectReason> {
        for predicate in &plan.where_clause.predicates {
            let Some(descriptor) = self.resolve(plan, &predicate.path) else {
                return Err(RejectReason::UnresolvedField {
                    path: predicate.path.to_string(),
                });
            };

            let scalars: &[Value] = match &predicate.value {
                Value::List(items) => items,
                scalar => std::slice::from_ref(scalar),
            };
            for scalar in scalars {
                if !descriptor.ty.accepts(scalar) {
                    return Err(RejectReason::TypeMismatch {
                        field: predicate.path.to_string(),
                        expected: descriptor.ty,
                        found: scalar.family(),
                    });
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, plan: &CompiledPlan, path: &FieldPath) -> Option<&'static FieldDescriptor> {
        let descriptor = self.catalog.describe(plan.entity);
        match path {
            FieldPath::Local(field) => descriptor.field(field),
            FieldPath::Related { relation, field } => {
                let relation = descriptor.relation(relation)?;
                self.catalog.describe(relation.target).field(field)
            }
        }
    }
}
