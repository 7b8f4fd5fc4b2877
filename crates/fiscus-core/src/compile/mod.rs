pub(crate) mod render;

#[cfg(test)]
mod tests;

use crate::{
    auth::AuthContext,
    catalog::Catalog,
    config::RuntimeConfig,
    error::CompileError,
    intent::{FieldPath, Filter, FilterOp, Intent, TimeRange},
    plan::{
        AggregateClause, CompiledPlan, JoinPath, OrderDirection, OrderSpec, PlanOp,
        PredicateOrigin, WhereClause, WherePredicate,
    },
    value::Value,
};
use chrono::NaiveDate;

///
/// Compiler
///
/// Pure intent → plan lowering. Deterministic given (intent, catalog
/// version): same inputs always yield a byte-identical plan, including the
/// readable query text. The compiler appends the tenant-scope predicate
/// itself; it is the one component allowed to mint `TenantScope` origin.
///

#[derive(Clone, Copy, Debug)]
pub struct Compiler {
    catalog: Catalog,
    max_joins: usize,
    literal_max_chars: usize,
}

impl Compiler {
    #[must_use]
    pub const fn new(catalog: Catalog, config: &RuntimeConfig) -> Self {
        Self {
            catalog,
            max_joins: config.max_joins,
            literal_max_chars: config.literal_max_chars,
        }
    }

    /// Compile a validated intent under the caller's authorization scope.
    pub fn compile(
        &self,
        intent: &Intent,
        auth: &AuthContext,
    ) -> Result<CompiledPlan, CompileError> {
        let descriptor = self.catalog.describe(intent.entity);

        // Tenant scope first: without it nothing else may proceed. Entities
        // with no tenant field are municipality-independent reference data.
        let scope = auth
            .municipality()
            .ok_or(CompileError::MissingTenantScope)?;

        let mut predicates = Vec::new();
        for filter in &intent.filters {
            lower_filter(filter, &mut predicates);
        }

        if let Some(range) = &intent.time_range {
            lower_time_range(range, descriptor, &mut predicates);
        }

        if let Some(tenant_field) = descriptor.tenant_field {
            predicates.push(WherePredicate {
                path: FieldPath::Local(tenant_field.to_string()),
                op: PlanOp::Eq,
                value: Value::Text(scope.as_str().to_string()),
                origin: PredicateOrigin::TenantScope,
            });
        }

        let joins = resolve_joins(intent, descriptor);
        if joins.len() > self.max_joins {
            return Err(CompileError::PlanTooComplex {
                joins: joins.len(),
                max: self.max_joins,
            });
        }

        let aggregate = intent.aggregation.field.as_ref().map(|field| {
            AggregateClause {
                kind: intent.aggregation.kind,
                field: field.clone(),
            }
        });

        // Aggregate plans select only their grouping dimensions; flat reads
        // select every queryable local field in catalog order.
        let select = if aggregate.is_some() {
            intent.group_by.clone()
        } else {
            descriptor
                .fields
                .iter()
                .filter(|field| field.queryable)
                .map(|field| field.name.to_string())
                .collect()
        };

        // Deterministic pagination: first grouping dimension, else primary key.
        let order_by = OrderSpec {
            field: intent
                .group_by
                .first()
                .cloned()
                .unwrap_or_else(|| "id".to_string()),
            direction: OrderDirection::Asc,
        };

        let mut datasets = vec![descriptor.dataset.to_string()];
        for join in &joins {
            let name = self.catalog.describe(join.target).dataset.to_string();
            if !datasets.contains(&name) {
                datasets.push(name);
            }
        }

        let where_clause = WhereClause { predicates };
        let mut plan = CompiledPlan {
            entity: intent.entity,
            select,
            where_clause,
            group_by: intent.group_by.clone(),
            aggregate,
            order_by,
            limit: intent.limit,
            joins,
            datasets,
            readable_query_text: String::new(),
        };
        plan.readable_query_text = render::readable_text(&plan, self.literal_max_chars);

        Ok(plan)
    }
}

/// Lower one validated filter into plan predicates.
///
/// `between` becomes an inclusive `>=`/`<=` pair so storage backends only
/// see the simple comparison set; everything else maps one-to-one.
fn lower_filter(filter: &Filter, out: &mut Vec<WherePredicate>) {
    match filter.op {
        FilterOp::Between => {
            let Value::List(bounds) = &filter.value else {
                // Validation guarantees the shape; an impossible literal
                // compiles to nothing rather than to an unbounded read.
                return;
            };
            let (Some(low), Some(high)) = (bounds.first(), bounds.get(1)) else {
                return;
            };
            out.push(predicate(filter, PlanOp::Gte, low.clone()));
            out.push(predicate(filter, PlanOp::Lte, high.clone()));
        }
        op => out.push(predicate(filter, plan_op(op), filter.value.clone())),
    }
}

const fn plan_op(op: FilterOp) -> PlanOp {
    match op {
        FilterOp::Eq => PlanOp::Eq,
        FilterOp::Ne => PlanOp::Ne,
        FilterOp::Lt => PlanOp::Lt,
        FilterOp::Lte => PlanOp::Lte,
        FilterOp::Gt => PlanOp::Gt,
        FilterOp::Gte => PlanOp::Gte,
        FilterOp::In => PlanOp::In,
        FilterOp::Contains => PlanOp::Contains,
        FilterOp::StartsWith => PlanOp::StartsWith,
        // `between` is lowered to a Gte/Lte pair before this table applies;
        // an equality mapping keeps the match total without widening reads.
        FilterOp::Between => PlanOp::Eq,
    }
}

fn predicate(filter: &Filter, op: PlanOp, value: Value) -> WherePredicate {
    WherePredicate {
        path: filter.path.clone(),
        op,
        value,
        origin: PredicateOrigin::User,
    }
}

/// Lower the intent's time range onto the entity's time axis.
fn lower_time_range(
    range: &TimeRange,
    descriptor: &crate::catalog::EntityDescriptor,
    out: &mut Vec<WherePredicate>,
) {
    match range {
        TimeRange::FiscalYear(id) => out.push(WherePredicate {
            path: FieldPath::Local("fiscalYearId".to_string()),
            op: PlanOp::Eq,
            value: Value::Text(id.clone()),
            origin: PredicateOrigin::TimeRange,
        }),
        TimeRange::Years { from, to } => {
            if descriptor.has_field("date") {
                // Validation bounds years to four digits, so both calendar
                // dates are always constructible.
                let low = NaiveDate::from_ymd_opt(*from, 1, 1);
                let high = NaiveDate::from_ymd_opt(*to, 12, 31);
                if let (Some(low), Some(high)) = (low, high) {
                    out.push(time_bound("date", PlanOp::Gte, Value::Date(low)));
                    out.push(time_bound("date", PlanOp::Lte, Value::Date(high)));
                }
            } else {
                out.push(time_bound("year", PlanOp::Gte, Value::Int(i64::from(*from))));
                out.push(time_bound("year", PlanOp::Lte, Value::Int(i64::from(*to))));
            }
        }
    }
}

fn time_bound(field: &str, op: PlanOp, value: Value) -> WherePredicate {
    WherePredicate {
        path: FieldPath::Local(field.to_string()),
        op,
        value,
        origin: PredicateOrigin::TimeRange,
    }
}

/// Distinct relations touched by the intent's filters, in first-use order.
fn resolve_joins(
    intent: &Intent,
    descriptor: &crate::catalog::EntityDescriptor,
) -> Vec<JoinPath> {
    let mut joins: Vec<JoinPath> = Vec::new();
    for filter in &intent.filters {
        let Some(name) = filter.path.relation() else {
            continue;
        };
        if joins.iter().any(|join| join.relation == name) {
            continue;
        }
        if let Some(relation) = descriptor.relation(name) {
            joins.push(JoinPath {
                relation: name.to_string(),
                target: relation.target,
            });
        }
    }
    joins
}
