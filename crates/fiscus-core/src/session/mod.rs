
use crate::{
    audit::{AuditDraft, AuditOutcome, AuditRecorder, AuditSink, QueryAuditId},
    auth::AuthContext,
    catalog::Catalog,
    chart::ChartSpec,
    compile::Compiler,
    config::RuntimeConfig,
    error::{Error, StorageError},
    exec::{ExecutionAdapter, ExecutionResult, Storage},
    guard::Guardrails,
    intent::{Intent, RawIntent},
    plan::CompiledPlan,
};
use std::sync::Arc;

///
/// QueryOutcome
///
/// A successful lifecycle: the rows, the chart chosen for them, and the id
/// of the audit record written for this call.
///

#[derive(Clone, Debug)]
pub struct QueryOutcome {
    pub result: ExecutionResult,
    pub chart_spec: ChartSpec,
    pub audit_id: QueryAuditId,
}

///
/// QueryService
///
/// Front door for one query lifecycle: validate, compile, guardrail,
/// execute, chart, audit. Every call writes exactly one audit record, on
/// success and on every failure path alike.
///

pub struct QueryService {
    catalog: Catalog,
    config: RuntimeConfig,
    compiler: Compiler,
    guardrails: Guardrails,
    adapter: ExecutionAdapter,
    recorder: AuditRecorder,
}

impl QueryService {
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        audit_sink: Arc<dyn AuditSink>,
        config: RuntimeConfig,
    ) -> Self {
        let catalog = Catalog::global();
        Self {
            catalog,
            compiler: Compiler::new(catalog, &config),
            guardrails: Guardrails::new(catalog, &config),
            adapter: ExecutionAdapter::new(storage, config.execution_timeout()),
            recorder: AuditRecorder::new(audit_sink),
            config,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> Catalog {
        self.catalog
    }

    /// Run one query end to end.
    ///
    /// The audit record is written before this returns, whatever happens:
    /// validation and compile failures audit the raw attempt, guardrail
    /// rejections audit the refused plan, storage failures audit the plan
    /// without rows or latency, and cancellation is recorded as such.
    pub fn run_query(
        &self,
        nl_query: Option<&str>,
        raw: &RawIntent,
        auth: &AuthContext,
    ) -> Result<QueryOutcome, Error> {
        let intent = match Intent::validate(raw, self.catalog, &self.config) {
            Ok(intent) => intent,
            Err(err) => {
                let err = Error::from(err);
                self.record_failure(
                    auth,
                    nl_query,
                    None,
                    serde_json::to_value(&raw.filters).ok(),
                    &err,
                );
                return Err(err);
            }
        };
        let filters_json = serde_json::to_value(&intent.filters).ok();

        let plan = match self.compiler.compile(&intent, auth) {
            Ok(plan) => plan,
            Err(err) => {
                let err = Error::from(err);
                self.record_failure(auth, nl_query, None, filters_json, &err);
                return Err(err);
            }
        };

        let plan = match self.guardrails.enforce(plan) {
            Ok(plan) => plan,
            Err(rejection) => {
                let err = Error::Guardrail(rejection.reason);
                self.record_failure(auth, nl_query, Some(&rejection.plan), filters_json, &err);
                return Err(err);
            }
        };

        tracing::debug!(
            entity = %plan.entity,
            fingerprint = %plan.fingerprint(),
            "plan approved for execution"
        );

        let execution = match self.adapter.execute(&plan) {
            Ok(execution) => execution,
            Err(err) => {
                let err = Error::from(err);
                self.record_failure(auth, nl_query, Some(&plan), filters_json, &err);
                return Err(err);
            }
        };

        let chart_spec = ChartSpec::select(&intent, &execution, self.catalog);
        let audit_id = self.recorder.record(AuditDraft {
            user_type: auth.user_type(),
            nl_query,
            plan: Some(&plan),
            filters_json,
            chart_spec: Some(&chart_spec),
            execution: Some(&execution),
            outcome: AuditOutcome::Completed,
        });

        Ok(QueryOutcome {
            result: execution,
            chart_spec,
            audit_id,
        })
    }

    fn record_failure(
        &self,
        auth: &AuthContext,
        nl_query: Option<&str>,
        plan: Option<&CompiledPlan>,
        filters_json: Option<serde_json::Value>,
        err: &Error,
    ) {
        let outcome = match err {
            Error::Guardrail(reason) => AuditOutcome::Rejected {
                reason: reason.kind().to_string(),
            },
            Error::Storage(StorageError::Cancelled) => AuditOutcome::Cancelled,
            other => AuditOutcome::Failed {
                kind: other.kind().to_string(),
            },
        };

        self.recorder.record(AuditDraft {
            user_type: auth.user_type(),
            nl_query,
            plan,
            filters_json,
            chart_spec: None,
            execution: None,
            outcome,
        });
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
