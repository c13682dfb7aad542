// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the join coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a parked partial lives before the rendezvous resets.
    /// Bounds the cost of a branch that never arrives; the job then stalls
    /// in waiting until re-stepped.
    #[serde(with = "humantime_serde")]
    pub partial_ttl: Duration,
    /// Claim-loop bound for simultaneous branch arrivals
    pub claim_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            partial_ttl: Duration::from_secs(300),
            claim_attempts: 3,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partial_ttl(mut self, ttl: Duration) -> Self {
        self.partial_ttl = ttl;
        self
    }

    pub fn with_claim_attempts(mut self, attempts: u32) -> Self {
        self.claim_attempts = attempts;
        self
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
