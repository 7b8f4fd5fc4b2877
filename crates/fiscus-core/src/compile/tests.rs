use super::*;
use crate::{
    catalog::Entity,
    error::ValidateError,
    intent::{RawAggregation, RawFilter, RawIntent},
};
use proptest::prelude::*;
use serde_json::json;

fn compiler() -> Compiler {
    Compiler::new(Catalog::global(), &RuntimeConfig::default())
}

fn auth() -> AuthContext {
    AuthContext::new(crate::auth::MunicipalityId::new("mun-001"), "citizen")
}

fn validate(raw: &RawIntent) -> Result<Intent, ValidateError> {
    Intent::validate(raw, Catalog::global(), &RuntimeConfig::default())
}

fn scenario_a() -> Intent {
    validate(&RawIntent {
        entity: "Expenditure".into(),
        aggregation: Some(RawAggregation {
            kind: "SUM".into(),
            field: Some("amountActual".into()),
        }),
        group_by: vec!["department".into()],
        filters: vec![RawFilter {
            field: "fiscalYearId".into(),
            op: "eq".into(),
            value: json!("FY2024"),
        }],
        time_range: None,
        limit: Some(50),
    })
    .unwrap()
}

#[test]
fn grouped_sum_compiles_to_the_expected_shape() {
    let plan = compiler().compile(&scenario_a(), &auth()).unwrap();

    assert_eq!(plan.entity, Entity::Expenditure);
    assert_eq!(plan.group_by, vec!["department".to_string()]);
    let aggregate = plan.aggregate.as_ref().unwrap();
    assert_eq!(aggregate.kind, crate::intent::AggregateKind::Sum);
    assert_eq!(aggregate.field, "amountActual");
    assert_eq!(plan.order_by.field, "department");
    assert_eq!(plan.limit, 50);

    let tenant = plan.where_clause.tenant_predicate().unwrap();
    assert_eq!(tenant.value, Value::Text("mun-001".into()));
}

#[test]
fn readable_text_is_exact_and_stable() {
    let plan = compiler().compile(&scenario_a(), &auth()).unwrap();

    assert_eq!(
        plan.readable_query_text,
        "SELECT department, sum(amountActual) FROM Expenditure \
         WHERE fiscalYearId = 'FY2024' AND municipalityId = 'mun-001' \
         GROUP BY department ORDER BY department ASC LIMIT 50"
    );
}

#[test]
fn compile_is_deterministic() {
    let intent = scenario_a();
    let a = compiler().compile(&intent, &auth()).unwrap();
    let b = compiler().compile(&intent, &auth()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.readable_query_text, b.readable_query_text);
}

#[test]
fn missing_tenant_scope_is_fatal() {
    let err = compiler()
        .compile(&scenario_a(), &AuthContext::unscoped("citizen"))
        .unwrap_err();
    assert_eq!(err, CompileError::MissingTenantScope);
}

#[test]
fn user_filter_cannot_displace_the_tenant_predicate() {
    let intent = validate(&RawIntent {
        entity: "Expenditure".into(),
        filters: vec![RawFilter {
            field: "municipalityId".into(),
            op: "eq".into(),
            value: json!("mun-999"),
        }],
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();

    // The attacker's predicate survives as a user filter, but the scope
    // predicate is still present and still pins mun-001; the conjunction
    // can only narrow.
    let tenant = plan.where_clause.tenant_predicate().unwrap();
    assert_eq!(tenant.value, Value::Text("mun-001".into()));
    assert_eq!(plan.where_clause.user_predicates().count(), 1);
}

#[test]
fn one_hop_filter_produces_a_join_and_its_dataset() {
    let intent = validate(&RawIntent {
        entity: "Expenditure".into(),
        filters: vec![RawFilter {
            field: "supplier.sector".into(),
            op: "eq".into(),
            value: json!("construction"),
        }],
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();

    assert_eq!(plan.joins.len(), 1);
    assert_eq!(plan.joins[0].relation, "supplier");
    assert_eq!(plan.joins[0].target, Entity::Supplier);
    assert_eq!(
        plan.datasets,
        vec!["expenditures".to_string(), "suppliers".to_string()]
    );
}

#[test]
fn between_lowers_to_an_inclusive_bound_pair() {
    let intent = validate(&RawIntent {
        entity: "Expenditure".into(),
        filters: vec![RawFilter {
            field: "amountActual".into(),
            op: "between".into(),
            value: json!(["100.50", "200.75"]),
        }],
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();
    let user: Vec<_> = plan.where_clause.user_predicates().collect();

    assert_eq!(user.len(), 2);
    assert_eq!(user[0].op, PlanOp::Gte);
    assert_eq!(user[0].value, Value::Decimal("100.50".parse().unwrap()));
    assert_eq!(user[1].op, PlanOp::Lte);
    assert_eq!(user[1].value, Value::Decimal("200.75".parse().unwrap()));
    assert!(plan.readable_query_text.contains("amountActual >= 100.50"));
    assert!(plan.readable_query_text.contains("amountActual <= 200.75"));
}

#[test]
fn flat_reads_order_by_id_and_select_queryable_fields() {
    let intent = validate(&RawIntent {
        entity: "Budget".into(),
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();

    assert_eq!(plan.order_by.field, "id");
    assert!(plan.select.contains(&"amountPlanned".to_string()));
    assert!(!plan.select.contains(&"notes".to_string()));
}

#[test]
fn fiscal_year_time_range_becomes_a_time_origin_predicate() {
    let intent = validate(&RawIntent {
        entity: "Budget".into(),
        time_range: Some(crate::intent::RawTimeRange {
            fiscal_year_id: Some("FY2024".into()),
            ..Default::default()
        }),
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();
    let time: Vec<_> = plan
        .where_clause
        .predicates
        .iter()
        .filter(|p| p.origin == PredicateOrigin::TimeRange)
        .collect();

    assert_eq!(time.len(), 1);
    assert_eq!(time[0].path, FieldPath::Local("fiscalYearId".into()));
}

#[test]
fn year_time_range_lowers_to_an_inclusive_date_pair() {
    let intent = validate(&RawIntent {
        entity: "Expenditure".into(),
        time_range: Some(crate::intent::RawTimeRange {
            from_year: Some(2023),
            to_year: Some(2024),
            ..Default::default()
        }),
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();
    let time: Vec<_> = plan
        .where_clause
        .predicates
        .iter()
        .filter(|p| p.origin == PredicateOrigin::TimeRange)
        .collect();

    // Validation caps years at four digits, so the range always lowers to
    // both calendar bounds; a plan missing either would silently widen or
    // ignore the caller's requested window.
    assert_eq!(time.len(), 2);
    assert_eq!(time[0].op, PlanOp::Gte);
    assert_eq!(time[0].value, Value::Date("2023-01-01".parse().unwrap()));
    assert_eq!(time[1].op, PlanOp::Lte);
    assert_eq!(time[1].value, Value::Date("2024-12-31".parse().unwrap()));
}

#[test]
fn reference_entities_compile_without_a_tenant_predicate() {
    let intent = validate(&RawIntent {
        entity: "Supplier".into(),
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();
    assert!(plan.where_clause.tenant_predicate().is_none());
    assert_eq!(plan.datasets, vec!["suppliers".to_string()]);
}

#[test]
fn crafted_literal_cannot_break_out_of_the_readable_text() {
    let intent = validate(&RawIntent {
        entity: "Expenditure".into(),
        filters: vec![RawFilter {
            field: "department".into(),
            op: "eq".into(),
            value: json!("x' OR '1'='1"),
        }],
        ..RawIntent::default()
    })
    .unwrap();

    let plan = compiler().compile(&intent, &auth()).unwrap();
    assert!(
        plan.readable_query_text
            .contains("department = 'x'' OR ''1''=''1'")
    );
}

// Fuzzed tenant-scope property: whatever filter combination a caller
// supplies over a municipality-owned entity, the compiled plan carries
// exactly one tenant-scope predicate pinning the caller's municipality,
// and the limit stays inside [1, 5000].

fn arb_filter() -> impl Strategy<Value = RawFilter> {
    let field_op = prop_oneof![
        Just(("department", "eq")),
        Just(("department", "contains")),
        Just(("category", "startsWith")),
        Just(("fiscalYearId", "eq")),
        Just(("municipalityId", "eq")),
        Just(("supplier.sector", "eq")),
    ];
    (field_op, "[a-zA-Z0-9' -]{0,24}").prop_map(|((field, op), text)| RawFilter {
        field: field.to_string(),
        op: op.to_string(),
        value: json!(text),
    })
}

proptest! {
    #[test]
    fn tenant_scope_is_always_present_and_non_overridable(
        filters in proptest::collection::vec(arb_filter(), 0..6),
        group in prop_oneof![Just(vec![]), Just(vec!["department".to_string()])],
        limit in proptest::option::of(any::<i64>()),
    ) {
        let raw = RawIntent {
            entity: "Expenditure".into(),
            aggregation: None,
            group_by: group,
            filters,
            time_range: None,
            limit,
        };
        let intent = validate(&raw).unwrap();
        let plan = compiler().compile(&intent, &auth()).unwrap();

        let tenant: Vec<_> = plan
            .where_clause
            .predicates
            .iter()
            .filter(|p| p.origin == PredicateOrigin::TenantScope)
            .collect();
        prop_assert_eq!(tenant.len(), 1);
        prop_assert_eq!(&tenant[0].path, &FieldPath::Local("municipalityId".into()));
        prop_assert_eq!(&tenant[0].value, &Value::Text("mun-001".into()));
        prop_assert_eq!(tenant[0].op, PlanOp::Eq);

        prop_assert!(plan.limit >= 1 && plan.limit <= 5000);
    }
}
