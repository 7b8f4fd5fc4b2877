use serde::Deserialize;
use std::time::Duration;

///
/// RuntimeConfig
///
/// Limits and timeouts for the query pipeline. Built by the process
/// bootstrap (defaults or TOML) and injected into the session; never a
/// global. The defaults are the product's hard guardrail constants.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Row limit applied when the intent does not specify one.
    pub default_limit: u32,
    /// Hard ceiling on returned rows; larger requests are clamped, not
    /// rejected.
    pub max_limit: u32,
    /// Maximum groupBy dimensions per intent.
    pub max_group_by: usize,
    /// Maximum joined relations per plan.
    pub max_joins: usize,
    /// Per-literal truncation applied to the readable query text, bounding
    /// audit record size.
    pub literal_max_chars: usize,
    /// Per-query execution budget enforced by the execution adapter.
    pub execution_timeout_ms: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 5000;
    pub const MAX_GROUP_BY: usize = 3;
    pub const MAX_JOINS: usize = 3;
    pub const LITERAL_MAX_CHARS: usize = 200;
    pub const EXECUTION_TIMEOUT_MS: u64 = 30_000;

    /// Parse a config from TOML, filling unset keys with defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    #[must_use]
    pub const fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_limit: Self::DEFAULT_LIMIT,
            max_limit: Self::MAX_LIMIT,
            max_group_by: Self::MAX_GROUP_BY,
            max_joins: Self::MAX_JOINS,
            literal_max_chars: Self::LITERAL_MAX_CHARS,
            execution_timeout_ms: Self::EXECUTION_TIMEOUT_MS,
        }
    }
}
