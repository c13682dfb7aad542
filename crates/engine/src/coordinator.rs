// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parallel join coordinator
//!
//! Rendezvous-merges two concurrently-executing branches of one job and
//! triggers the next stage exactly once. The branches share no in-process
//! memory; the partial-result cache is the only shared mutable resource,
//! and its atomic check-and-set / check-and-delete are what make the join
//! exactly-once. If a parked partial expires before its sibling arrives,
//! the late sibling becomes a fresh first arrival: bounded staleness over
//! unbounded wait.

use crate::config::EngineConfig;
use crate::error::{EngineError, ValidationError};
use crate::trigger::ContinuationTrigger;
use fab_adapters::{ContinuationDispatch, PartialRecord, RendezvousCache, RendezvousKey};
use fab_core::{
    merge_outputs, next_stage, BuildContext, ContextPatch, JobId, JobStatus, JoinPoint, Stage,
    StageDecision, StageOutputs, JOIN_LOGIC_LAYOUT,
};
use fab_storage::JobStore;
use tracing::{debug, info};

/// Result of one branch's `check_completion` call
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// First arrival: the partial is parked, the sibling has not reported
    Waiting,
    /// Second arrival: both partials merged, the next stage was triggered
    Merged { context: BuildContext },
}

pub struct JoinCoordinator<S, C, D> {
    store: S,
    cache: C,
    trigger: ContinuationTrigger<D>,
    join: JoinPoint,
    config: EngineConfig,
}

impl<S, C, D> JoinCoordinator<S, C, D>
where
    S: JobStore,
    C: RendezvousCache,
    D: ContinuationDispatch,
{
    pub fn new(store: S, cache: C, dispatch: D, config: EngineConfig) -> Self {
        Self {
            store,
            cache,
            trigger: ContinuationTrigger::new(dispatch),
            join: JOIN_LOGIC_LAYOUT,
            config,
        }
    }

    /// One branch reports its partial output.
    ///
    /// First arrival parks the partial in the cache and moves the job to
    /// `waiting_for_parallel_completion`. Second arrival consumes the parked
    /// entry, merges, advances past the join point, and fires the
    /// continuation exactly once. Retries are safe: the rendezvous keys on
    /// (job, join-point), and a branch re-reporting its own partial
    /// refreshes the parked entry instead of merging with itself.
    pub async fn check_completion(
        &self,
        job_id: &JobId,
        partial: StageOutputs,
    ) -> Result<JoinOutcome, EngineError> {
        let branch = validate_partial(&partial, &self.join)?;
        let context = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(job_id.clone()))?;
        let key = RendezvousKey::new(job_id.clone(), self.join.id);

        for _ in 0..self.config.claim_attempts {
            if let Some(parked) = self.cache.take(&key).await? {
                if parked.branch != branch {
                    let merged = self
                        .merge_and_advance(job_id, &context, &parked, &partial, branch)
                        .await?;
                    return Ok(JoinOutcome::Merged { context: merged });
                }
                // Same branch re-reporting (client retry). Fall through and
                // re-park the fresh partial rather than merging a branch
                // with itself.
                debug!(job = %job_id, branch = %branch, "branch re-reported, refreshing rendezvous");
            }

            let record = PartialRecord::new(branch, partial.clone());
            if self
                .cache
                .set_if_absent(&key, record, self.config.partial_ttl)
                .await?
            {
                if context.status != JobStatus::WaitingForParallelCompletion {
                    self.store
                        .update(
                            job_id,
                            ContextPatch::status(JobStatus::WaitingForParallelCompletion),
                        )
                        .await?;
                }
                debug!(job = %job_id, branch = %branch, "first arrival parked, waiting for sibling");
                return Ok(JoinOutcome::Waiting);
            }
            // The sibling claimed the slot between our take and set; the
            // next pass consumes its entry.
        }

        Err(EngineError::Contention(key))
    }

    async fn merge_and_advance(
        &self,
        job_id: &JobId,
        context: &BuildContext,
        parked: &PartialRecord,
        partial: &StageOutputs,
        branch: Stage,
    ) -> Result<BuildContext, EngineError> {
        let merged = merge_outputs(&parked.outputs, partial)?;

        // Where the dispatcher lands once both branch outputs are applied
        let decision = {
            let mut preview = context.clone();
            preview.outputs = merge_outputs(&context.outputs, &merged)?;
            next_stage(&preview)
        };

        match decision {
            StageDecision::Run(stage) => {
                let patch = ContextPatch::status(JobStatus::InProgress)
                    .with_stage(stage)
                    .with_outputs(merged);
                let updated = self.store.update(job_id, patch).await?;
                info!(job = %job_id, branch = %branch, stage = %stage, "branches merged, advancing");
                self.trigger.fire(stage, &updated).await;
                Ok(updated)
            }
            StageDecision::Completed => {
                let patch =
                    ContextPatch::status(JobStatus::InProgress).with_outputs(merged);
                self.store.update(job_id, patch).await?;
                let done = self
                    .store
                    .update(job_id, ContextPatch::status(JobStatus::Completed))
                    .await?;
                info!(job = %job_id, branch = %branch, "branches merged, every output present");
                Ok(done)
            }
        }
    }
}

/// Shape-check a branch partial before any I/O happens.
///
/// A malformed partial is rejected with no state mutation: exactly one
/// populated output, and it must belong to one of the join point's branches.
fn validate_partial(
    partial: &StageOutputs,
    join: &JoinPoint,
) -> Result<Stage, ValidationError> {
    let populated = partial.populated();
    match populated.as_slice() {
        [] => Err(ValidationError::EmptyPartial),
        [stage] if join.has_branch(*stage) => Ok(*stage),
        [stage] => Err(ValidationError::NotABranch(*stage)),
        more => Err(ValidationError::MultipleOutputs(more.len())),
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
