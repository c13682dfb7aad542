// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step-forward driver
//!
//! Decides what should happen next for a job without making it happen: the
//! dispatcher is pure and the driver never executes or triggers a stage.
//! Re-invoking a step is safe, and it doubles as the manual escape hatch for
//! a job stalled in `waiting_for_parallel_completion` after a rendezvous
//! TTL expiry.

use crate::error::EngineError;
use fab_core::{
    next_stage, BuildContext, ContextPatch, IdGen, JobId, JobStatus, Stage, StageDecision,
};
use fab_storage::JobStore;
use tracing::debug;

/// Result of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The named stage should run next
    Next(Stage),
    /// Every required output is populated; the job is complete
    Completed,
}

pub struct StepDriver<S, I> {
    store: S,
    id_gen: I,
}

impl<S, I> StepDriver<S, I>
where
    S: JobStore,
    I: IdGen,
{
    pub fn new(store: S, id_gen: I) -> Self {
        Self { store, id_gen }
    }

    /// Create a job in `pending` from a user's tool request
    pub async fn submit(&self, request: impl Into<String>) -> Result<BuildContext, EngineError> {
        let context = BuildContext::new(self.id_gen.next(), request);
        self.store.create(context.clone()).await?;
        debug!(job = %context.id, "job submitted");
        Ok(context)
    }

    /// Load the job, mark it `in_progress`, and return the dispatcher's
    /// decision without executing it. When every output is present the job
    /// is moved to `completed` instead.
    pub async fn step_forward(&self, job_id: &JobId) -> Result<StepOutcome, EngineError> {
        let context = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(job_id.clone()))?;

        match next_stage(&context) {
            StageDecision::Run(stage) => {
                let mut patch = ContextPatch::default().with_stage(stage);
                if context.status != JobStatus::InProgress {
                    patch.status = Some(JobStatus::InProgress);
                }
                self.store.update(job_id, patch).await?;
                debug!(job = %job_id, stage = %stage, "stepped forward");
                Ok(StepOutcome::Next(stage))
            }
            StageDecision::Completed => {
                if context.status != JobStatus::Completed {
                    self.store
                        .update(job_id, ContextPatch::status(JobStatus::Completed))
                        .await?;
                }
                Ok(StepOutcome::Completed)
            }
        }
    }

    /// Record an unrecoverable stage failure
    pub async fn mark_failed(
        &self,
        job_id: &JobId,
        reason: impl Into<String>,
    ) -> Result<BuildContext, EngineError> {
        let patch = ContextPatch::status(JobStatus::Failed).with_error(reason);
        Ok(self.store.update(job_id, patch).await?)
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
