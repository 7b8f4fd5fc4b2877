//! Raw-intent validation: the only path from untrusted payloads into
//! [`Intent`]. Field resolution, operator allow-lists, join-depth fencing,
//! literal coercion, and limit clamping all happen here, in that order per
//! filter, so error reporting names the first offending element.

use crate::{
    catalog::{Catalog, Entity, FieldDescriptor, FieldType},
    config::RuntimeConfig,
    error::ValidateError,
    intent::{
        AggregateKind, Aggregation, FieldPath, Filter, FilterOp, Intent, RawFilter, RawIntent,
        RawTimeRange, TimeRange,
    },
    value::{Value, ValueFamily},
};
use rust_decimal::Decimal;

impl Intent {
    /// Validate an untrusted payload against the catalog.
    ///
    /// `limit` is the one lenient rule: out-of-range values are clamped to
    /// `[1, max_limit]` rather than rejected. Everything else fails fast.
    pub fn validate(
        raw: &RawIntent,
        catalog: Catalog,
        config: &RuntimeConfig,
    ) -> Result<Self, ValidateError> {
        let entity = Entity::parse(&raw.entity)?;
        let aggregation = validate_aggregation(raw.aggregation.as_ref(), entity, catalog)?;
        let group_by = validate_group_by(&raw.group_by, entity, catalog, config)?;

        let mut filters = Vec::with_capacity(raw.filters.len());
        for filter in &raw.filters {
            filters.push(validate_filter(filter, entity, catalog)?);
        }

        let time_range = raw
            .time_range
            .as_ref()
            .map(|range| validate_time_range(range, entity, catalog))
            .transpose()?;

        Ok(Self {
            entity,
            aggregation,
            group_by,
            filters,
            time_range,
            limit: clamp_limit(raw.limit, config),
        })
    }
}

/// Clamp the requested limit into `[1, max_limit]`, defaulting when absent.
fn clamp_limit(requested: Option<i64>, config: &RuntimeConfig) -> u32 {
    let Some(requested) = requested else {
        return config.default_limit;
    };
    let max = i64::from(config.max_limit);
    u32::try_from(requested.clamp(1, max)).unwrap_or(config.max_limit)
}

fn validate_aggregation(
    raw: Option<&super::RawAggregation>,
    entity: Entity,
    catalog: Catalog,
) -> Result<Aggregation, ValidateError> {
    let Some(raw) = raw else {
        return Ok(Aggregation::none());
    };

    let kind = AggregateKind::parse(&raw.kind)?;
    if kind.is_none() {
        return Ok(Aggregation::none());
    }

    let Some(field) = raw.field.as_deref().filter(|field| !field.is_empty()) else {
        return Err(ValidateError::AggregationFieldMissing {
            kind: kind.as_str().to_string(),
        });
    };

    let descriptor = catalog.describe(entity);
    if descriptor.field(field).is_none() {
        return Err(ValidateError::UnknownField {
            entity: entity.to_string(),
            field: field.to_string(),
        });
    }
    if !catalog.is_aggregatable(entity, field) {
        return Err(ValidateError::FieldNotAggregatable {
            entity: entity.to_string(),
            field: field.to_string(),
        });
    }

    Ok(Aggregation {
        kind,
        field: Some(field.to_string()),
    })
}

fn validate_group_by(
    raw: &[String],
    entity: Entity,
    catalog: Catalog,
    config: &RuntimeConfig,
) -> Result<Vec<String>, ValidateError> {
    if raw.len() > config.max_group_by {
        return Err(ValidateError::TooManyGroupByFields {
            found: raw.len(),
            max: config.max_group_by,
        });
    }

    let descriptor = catalog.describe(entity);
    for field in raw {
        let Some(found) = descriptor.field(field) else {
            return Err(ValidateError::UnknownField {
                entity: entity.to_string(),
                field: field.clone(),
            });
        };
        if !found.queryable {
            return Err(ValidateError::FieldNotQueryable {
                entity: entity.to_string(),
                field: field.clone(),
            });
        }
        if !found.groupable {
            return Err(ValidateError::FieldNotGroupable {
                entity: entity.to_string(),
                field: field.clone(),
            });
        }
    }

    Ok(raw.to_vec())
}

fn validate_filter(
    raw: &RawFilter,
    entity: Entity,
    catalog: Catalog,
) -> Result<Filter, ValidateError> {
    let path = FieldPath::parse(&raw.field)?;
    let descriptor = resolve_field(&path, entity, catalog)?;

    let op = FilterOp::parse(&raw.op, &raw.field)?;
    check_operator_allowed(descriptor.ty, op, &raw.field)?;

    let value = coerce_filter_value(&raw.value, descriptor, op, &raw.field)?;

    Ok(Filter { path, op, value })
}

/// Resolve a validated field path to its catalog descriptor, following at
/// most one declared relation hop.
fn resolve_field(
    path: &FieldPath,
    entity: Entity,
    catalog: Catalog,
) -> Result<&'static FieldDescriptor, ValidateError> {
    let descriptor = catalog.describe(entity);

    let (owner, field) = match path {
        FieldPath::Local(field) => (entity, field.as_str()),
        FieldPath::Related { relation, field } => {
            let Some(relation) = descriptor.relation(relation) else {
                return Err(ValidateError::UnknownRelation {
                    entity: entity.to_string(),
                    relation: relation.clone(),
                });
            };
            (relation.target, field.as_str())
        }
    };

    let Some(found) = catalog.describe(owner).field(field) else {
        return Err(ValidateError::UnknownField {
            entity: owner.to_string(),
            field: field.to_string(),
        });
    };
    if !found.queryable {
        return Err(ValidateError::FieldNotQueryable {
            entity: owner.to_string(),
            field: field.to_string(),
        });
    }

    Ok(found)
}

/// Per-field-type operator allow-lists.
///
/// Numeric and date fields take the ordered comparison set; text takes the
/// match set; bool and reference fields take equality only.
fn check_operator_allowed(ty: FieldType, op: FilterOp, field: &str) -> Result<(), ValidateError> {
    let allowed = match ty {
        FieldType::Int | FieldType::Decimal | FieldType::Date => matches!(
            op,
            FilterOp::Eq
                | FilterOp::Ne
                | FilterOp::Lt
                | FilterOp::Lte
                | FilterOp::Gt
                | FilterOp::Gte
                | FilterOp::In
                | FilterOp::Between
        ),
        FieldType::Text => matches!(op, FilterOp::Eq | FilterOp::Contains | FilterOp::StartsWith),
        FieldType::Bool | FieldType::Ref(_) => matches!(op, FilterOp::Eq | FilterOp::Ne),
    };

    if allowed {
        Ok(())
    } else {
        Err(ValidateError::UnsupportedOperator {
            field: field.to_string(),
            op: op.to_string(),
        })
    }
}

fn coerce_filter_value(
    raw: &serde_json::Value,
    descriptor: &FieldDescriptor,
    op: FilterOp,
    field: &str,
) -> Result<Value, ValidateError> {
    if op.takes_list() {
        let Some(items) = raw.as_array() else {
            return Err(ValidateError::MalformedLiteral {
                field: field.to_string(),
                detail: format!("operator '{op}' requires a list literal"),
            });
        };
        if op == FilterOp::Between && items.len() != 2 {
            return Err(ValidateError::MalformedLiteral {
                field: field.to_string(),
                detail: format!("'between' requires exactly 2 bounds, found {}", items.len()),
            });
        }
        let coerced = items
            .iter()
            .map(|item| coerce_scalar(item, descriptor.ty, field))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(coerced));
    }

    coerce_scalar(raw, descriptor.ty, field)
}

/// Coerce one JSON scalar toward the field's declared type.
///
/// Decimal literals may arrive as JSON strings; that path is lossless and
/// is the one monetary filters should take. Integer JSON numbers widen
/// exactly. Dates are ISO `YYYY-MM-DD` strings.
fn coerce_scalar(
    raw: &serde_json::Value,
    ty: FieldType,
    field: &str,
) -> Result<Value, ValidateError> {
    let mismatch = || ValidateError::LiteralTypeMismatch {
        field: field.to_string(),
        expected: ty,
        found: json_family(raw),
    };

    match ty {
        FieldType::Text | FieldType::Ref(_) => raw
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(mismatch),
        FieldType::Bool => raw.as_bool().map(Value::Bool).ok_or_else(mismatch),
        FieldType::Int => raw.as_i64().map(Value::Int).ok_or_else(mismatch),
        FieldType::Decimal => match raw {
            serde_json::Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    return Ok(Value::Int(int));
                }
                n.to_string()
                    .parse::<Decimal>()
                    .map(Value::Decimal)
                    .map_err(|_| ValidateError::MalformedLiteral {
                        field: field.to_string(),
                        detail: format!("'{n}' is not a representable decimal"),
                    })
            }
            serde_json::Value::String(s) => {
                s.parse::<Decimal>().map(Value::Decimal).map_err(|_| {
                    ValidateError::MalformedLiteral {
                        field: field.to_string(),
                        detail: format!("'{s}' is not a decimal"),
                    }
                })
            }
            _ => Err(mismatch()),
        },
        FieldType::Date => {
            let Some(s) = raw.as_str() else {
                return Err(mismatch());
            };
            s.parse::<chrono::NaiveDate>().map(Value::Date).map_err(|_| {
                ValidateError::MalformedLiteral {
                    field: field.to_string(),
                    detail: format!("'{s}' is not an ISO date"),
                }
            })
        }
    }
}

fn json_family(raw: &serde_json::Value) -> ValueFamily {
    match raw {
        serde_json::Value::Null => ValueFamily::Null,
        serde_json::Value::Bool(_) => ValueFamily::Bool,
        serde_json::Value::Number(_) => ValueFamily::Numeric,
        serde_json::Value::String(_) => ValueFamily::Text,
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => ValueFamily::List,
    }
}

fn validate_time_range(
    raw: &RawTimeRange,
    entity: Entity,
    catalog: Catalog,
) -> Result<TimeRange, ValidateError> {
    let descriptor = catalog.describe(entity);

    match (raw.fiscal_year_id.as_deref(), raw.from_year, raw.to_year) {
        (Some(id), None, None) => {
            if !descriptor.has_field("fiscalYearId") {
                return Err(ValidateError::TimeRangeNotApplicable {
                    entity: entity.to_string(),
                });
            }
            Ok(TimeRange::FiscalYear(id.to_string()))
        }
        (None, Some(from), Some(to)) => {
            if !descriptor.has_field("date") && !descriptor.has_field("year") {
                return Err(ValidateError::TimeRangeNotApplicable {
                    entity: entity.to_string(),
                });
            }
            // Four-digit years only; keeps every bound representable as a
            // calendar date when the compiler lowers the range.
            for year in [from, to] {
                if !(1000..=9999).contains(&year) {
                    return Err(ValidateError::MalformedLiteral {
                        field: "timeRange".to_string(),
                        detail: format!("year {year} is outside the supported range 1000..=9999"),
                    });
                }
            }
            if from > to {
                return Err(ValidateError::MalformedLiteral {
                    field: "timeRange".to_string(),
                    detail: format!("year range {from}..{to} is inverted"),
                });
            }
            Ok(TimeRange::Years { from, to })
        }
        _ => Err(ValidateError::MalformedLiteral {
            field: "timeRange".to_string(),
            detail: "exactly one of fiscalYearId or fromYear/toYear is required".to_string(),
        }),
    }
}
