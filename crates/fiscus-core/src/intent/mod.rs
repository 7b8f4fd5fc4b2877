mod validate;


use crate::{catalog::Entity, error::ValidateError, value::Value};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

///
/// RawIntent
///
/// Untrusted intent payload as delivered by the upstream natural-language
/// understanding step. Stringly-typed on purpose: nothing here is believed
/// until [`Intent::validate`] has checked it against the catalog. Raw
/// payloads never cross the validation boundary.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIntent {
    pub entity: String,
    pub aggregation: Option<RawAggregation>,
    pub group_by: Vec<String>,
    pub filters: Vec<RawFilter>,
    pub time_range: Option<RawTimeRange>,
    pub limit: Option<i64>,
}

///
/// RawAggregation
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAggregation {
    pub kind: String,
    #[serde(default)]
    pub field: Option<String>,
}

///
/// RawFilter
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawFilter {
    pub field: String,
    pub op: String,
    pub value: serde_json::Value,
}

///
/// RawTimeRange
///
/// Either an explicit fiscal year or an inclusive year range; supplying
/// both (or neither) is malformed.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTimeRange {
    pub fiscal_year_id: Option<String>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
}

///
/// AggregateKind
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    #[default]
    None,
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateKind {
    /// Parse a raw kind label, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, ValidateError> {
        let kind = match raw.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => {
                return Err(ValidateError::UnsupportedAggregation {
                    kind: raw.to_string(),
                });
            }
        };
        Ok(kind)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Aggregation
///
/// Invariant: `field` is present exactly when `kind` is not `None`, and
/// always names an aggregatable (decimal) field on the intent's entity.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Aggregation {
    pub kind: AggregateKind,
    pub field: Option<String>,
}

impl Aggregation {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: AggregateKind::None,
            field: None,
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.kind.is_none()
    }
}

///
/// FilterOp
///
/// The full operator allow-list. Which subset applies to a given filter
/// depends on the target field's declared type; see `validate`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Between,
    Contains,
    StartsWith,
}

impl FilterOp {
    /// Parse a raw operator token. Accepts camelCase and snake_case for the
    /// two-word operator; everything else must match exactly.
    pub fn parse(raw: &str, field: &str) -> Result<Self, ValidateError> {
        let op = match raw {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "in" => Self::In,
            "between" => Self::Between,
            "contains" => Self::Contains,
            "startsWith" | "starts_with" => Self::StartsWith,
            _ => {
                return Err(ValidateError::UnsupportedOperator {
                    field: field.to_string(),
                    op: raw.to_string(),
                });
            }
        };
        Ok(op)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::In => "in",
            Self::Between => "between",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
        }
    }

    /// True for operators whose literal is a list rather than a scalar.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::Between)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// FieldPath
///
/// A filter target: either a field on the intent's entity or a field one
/// hop away through a declared relation. Deeper paths are unrepresentable;
/// `parse` rejects them before any catalog lookup.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldPath {
    Local(String),
    Related { relation: String, field: String },
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, ValidateError> {
        let mut segments = raw.split('.');
        let first = segments.next().unwrap_or_default();
        match (segments.next(), segments.next()) {
            (None, _) => Ok(Self::Local(first.to_string())),
            (Some(field), None) => Ok(Self::Related {
                relation: first.to_string(),
                field: field.to_string(),
            }),
            (Some(_), Some(_)) => Err(ValidateError::UnsupportedJoinDepth {
                path: raw.to_string(),
            }),
        }
    }

    /// The relation segment, when this path leaves the base entity.
    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Related { relation, .. } => Some(relation),
        }
    }

    /// The terminal field name.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Local(field) | Self::Related { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(field) => write!(f, "{field}"),
            Self::Related { relation, field } => write!(f, "{relation}.{field}"),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

///
/// Filter
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filter {
    pub path: FieldPath,
    pub op: FilterOp,
    pub value: Value,
}

///
/// TimeRange
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeRange {
    FiscalYear(String),
    Years { from: i32, to: i32 },
}

///
/// Intent
///
/// Validated analytical intent. Every field reference has been resolved
/// against the catalog, every operator checked against its field-type
/// allow-list, and the limit clamped into [1, max]. Constructed only
/// through [`Intent::validate`].
///

#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    pub entity: Entity,
    pub aggregation: Aggregation,
    pub group_by: Vec<String>,
    pub filters: Vec<Filter>,
    pub time_range: Option<TimeRange>,
    pub limit: u32,
}
