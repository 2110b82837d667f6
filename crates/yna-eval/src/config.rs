//! Evaluator configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to one template evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Node evaluations allowed before the render fails with `GasExhausted`.
    pub gas_limit: u64,
    /// Bytes of loop output, across the whole render, after which no
    /// further loop elements are pulled.
    pub max_output_len: Option<usize>,
}

impl EvalConfig {
    pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_max_output_len(mut self, max: usize) -> Self {
        self.max_output_len = Some(max);
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            gas_limit: Self::DEFAULT_GAS_LIMIT,
            max_output_len: None,
        }
    }
}
