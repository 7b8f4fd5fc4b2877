use crate::{
    catalog::Catalog,
    exec::ExecutionResult,
    intent::Intent,
};
use serde::{Deserialize, Serialize};

///
/// ChartSpec
///
/// Closed set of default visualizations. Typed in memory; serialized to the
/// audit record's JSON column only at the persistence boundary, tagged as
/// `{"type": "bar", ...}`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartSpec {
    Bar { x: String, y: String },
    Line { x: String, y: String },
    Table,
    Metric { label: String },
}

impl ChartSpec {
    /// Pick the default visualization for a result shape.
    ///
    /// Deterministic over (intent, result); the result only matters in that
    /// this runs after execution so failed queries never reach it.
    ///
    /// - grouped aggregate on a time-like dimension → line
    /// - grouped aggregate otherwise → bar
    /// - scalar aggregate → metric
    /// - flat rows → table
    #[must_use]
    pub fn select(intent: &Intent, _result: &ExecutionResult, catalog: Catalog) -> Self {
        let Some(field) = intent.aggregation.field.as_ref() else {
            return Self::Table;
        };

        let Some(x) = intent.group_by.first() else {
            return Self::Metric {
                label: format!("{}({field})", intent.aggregation.kind),
            };
        };

        let (x, y) = (x.clone(), field.clone());
        if is_time_like(intent, &x, catalog) {
            Self::Line { x, y }
        } else {
            Self::Bar { x, y }
        }
    }
}

/// A grouping dimension is time-like when its declared type is a date or a
/// fiscal-year reference, or when it is the literal `year` column.
fn is_time_like(intent: &Intent, field: &str, catalog: Catalog) -> bool {
    if field == "year" {
        return true;
    }
    catalog
        .describe(intent.entity)
        .field(field)
        .is_some_and(|descriptor| descriptor.ty.is_time_like())
}
