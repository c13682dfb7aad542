// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial-result cache: the rendezvous primitive for the parallel join
//!
//! A shared key-value store with per-key time-to-live, scoped per
//! (job, join-point) so different jobs and join points never contend. The
//! trait deliberately exposes only atomic check-and-set and check-and-delete;
//! without that atomicity the join degrades to double merges or lost
//! updates, which is a correctness bug rather than an acceptable race.

mod memory;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use memory::MemoryCache;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FailingCache;

use async_trait::async_trait;
use fab_core::{JobId, Stage, StageOutputs};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Cache backend failure; retryable from the caller's point of view
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Composite key for one rendezvous: (job, join-point)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RendezvousKey {
    pub job: JobId,
    pub join_point: String,
}

impl RendezvousKey {
    pub fn new(job: JobId, join_point: impl Into<String>) -> Self {
        Self {
            job,
            join_point: join_point.into(),
        }
    }
}

impl std::fmt::Display for RendezvousKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.job, self.join_point)
    }
}

/// The first-arriving branch's contribution, parked until its sibling reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    /// Which branch produced this partial
    pub branch: Stage,
    pub outputs: StageOutputs,
}

impl PartialRecord {
    pub fn new(branch: Stage, outputs: StageOutputs) -> Self {
        Self { branch, outputs }
    }
}

/// Shared key-value store used only to rendezvous two parallel branches
#[async_trait]
pub trait RendezvousCache: Send + Sync {
    /// Atomic check-and-set: store the record under `key` with a TTL unless
    /// a live entry already exists. Returns true when the write happened.
    async fn set_if_absent(
        &self,
        key: &RendezvousKey,
        record: PartialRecord,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    /// Atomic check-and-delete: remove and return the live entry for `key`.
    /// A consumed entry can never be read again; an expired entry reads as
    /// absent.
    async fn take(&self, key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError>;

    /// Non-destructive read of the live entry for `key`
    async fn get(&self, key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError>;

    /// Drop the entry for `key`, if any
    async fn delete(&self, key: &RendezvousKey) -> Result<(), CacheError>;
}
