// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy
//!
//! Backend failures are retryable: the rendezvous keys on (job, join-point),
//! so a retried call lands on the same slot. Validation, conflict, and
//! transition errors are not retryable without fixing the payload.

use fab_adapters::{CacheError, RendezvousKey};
use fab_core::{ContextError, JobId, MergeConflict, Stage};
use fab_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the coordinator and driver
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid partial context: {0}")]
    Validation(#[from] ValidationError),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error(transparent)]
    Conflict(#[from] MergeConflict),
    #[error(transparent)]
    Transition(ContextError),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("rendezvous contention on {0}, claim attempts exhausted")]
    Contention(RendezvousKey),
}

/// Partial-context shape violations, checked before any I/O
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("partial context has no populated output")]
    EmptyPartial,
    #[error("partial context must carry a single branch output, got {0}")]
    MultipleOutputs(usize),
    #[error("stage {0} is not a branch of this join point")]
    NotABranch(Stage),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(JobId::from(id)),
            StoreError::Context(inner) => EngineError::Transition(inner),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// Whether the caller may safely retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Store(_) | EngineError::Cache(_) | EngineError::Contention(_)
        )
    }
}
