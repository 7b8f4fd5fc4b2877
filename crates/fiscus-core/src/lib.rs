//! Core runtime for Fiscus: the schema catalog, intent validation, plan
//! compilation, guardrails, execution, chart selection, and query auditing.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod chart;
pub mod compile;
pub mod config;
pub mod error;
pub mod exec;
pub mod guard;
pub mod intent;
pub mod plan;
pub mod session;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, adapters, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        auth::{AuthContext, MunicipalityId},
        catalog::{Catalog, Entity},
        chart::ChartSpec,
        intent::{Intent, RawIntent},
        session::{QueryOutcome, QueryService},
        value::Value,
    };
}
