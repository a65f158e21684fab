//! Validator options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorOptions {
    /// Deadline for each catalog call made during dynamic resolution.
    pub resolution_timeout_ms: u64,
    /// Upper bound on resolutions in flight within one layer.
    pub max_concurrent_resolutions: usize,
    /// Check literal config values against the resolved config schema.
    pub check_config_values: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            resolution_timeout_ms: 5_000,
            max_concurrent_resolutions: 8,
            check_config_values: true,
        }
    }
}

impl ValidatorOptions {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(ParseError::Options)
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    /// Concurrency limit, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_resolutions.max(1)
    }
}
