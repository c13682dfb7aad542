// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job store trait and in-memory implementation

use crate::error::StoreError;
use async_trait::async_trait;
use fab_core::{BuildContext, ContextPatch, JobId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Persistence seam for build context documents.
///
/// The store owns the document invariants: `update` loads the current
/// context, applies the patch through `BuildContext::apply`, and persists
/// the result, so callers can never write an illegal transition.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a freshly-submitted context
    async fn create(&self, context: BuildContext) -> Result<(), StoreError>;

    /// Fetch a context by job id
    async fn get(&self, id: &JobId) -> Result<Option<BuildContext>, StoreError>;

    /// Apply a patch and return the updated context
    async fn update(&self, id: &JobId, patch: ContextPatch) -> Result<BuildContext, StoreError>;

    /// All job ids known to the store
    async fn list(&self) -> Result<Vec<JobId>, StoreError>;
}

/// In-memory job store for tests and single-process deployments
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<Mutex<HashMap<JobId, BuildContext>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, context: BuildContext) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if jobs.contains_key(&context.id) {
            return Err(StoreError::AlreadyExists(context.id.to_string()));
        }
        jobs.insert(context.id.clone(), context);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> Result<Option<BuildContext>, StoreError> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.get(id).cloned())
    }

    async fn update(&self, id: &JobId, patch: ContextPatch) -> Result<BuildContext, StoreError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let slot = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut updated = slot.clone();
        updated.apply(patch)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn list(&self) -> Result<Vec<JobId>, StoreError> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.keys().cloned().collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
