//! ## Crate layout
//! - `core`: catalog, intent validation, plan compilation, guardrails,
//!   execution, chart selection, and audit recording.
//!
//! The `prelude` module mirrors the surface a query frontend uses.

pub use fiscus_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        audit::{AuditRecorder, AuditSink, QueryAudit, QueryAuditId},
        auth::{AuthContext, MunicipalityId},
        catalog::{Catalog, Entity},
        chart::ChartSpec,
        config::RuntimeConfig,
        exec::{ExecutionResult, Row, Storage},
        intent::{Intent, RawIntent},
        session::{QueryOutcome, QueryService},
        value::Value,
    };
    pub use serde::{Deserialize, Serialize};
}
