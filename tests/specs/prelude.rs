// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for engine specs

pub use fab_adapters::{FakeContinuation, MemoryCache};
pub use fab_core::{
    BuildContext, ContextPatch, FakeClock, JobId, JobStatus, SequentialIdGen, Stage, StageOutputs,
};
pub use fab_engine::{EngineConfig, JoinCoordinator, JoinOutcome, StepDriver, StepOutcome};
pub use fab_storage::{JobStore, MemoryJobStore};
pub use serde_json::json;

pub type SpecCoordinator =
    JoinCoordinator<MemoryJobStore, MemoryCache<FakeClock>, FakeContinuation>;

/// One engine wired to in-memory collaborators
pub struct Harness {
    pub store: MemoryJobStore,
    pub cache: MemoryCache<FakeClock>,
    pub clock: FakeClock,
    pub continuation: FakeContinuation,
    pub coordinator: SpecCoordinator,
    pub driver: StepDriver<MemoryJobStore, SequentialIdGen>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        let store = MemoryJobStore::new();
        let cache = MemoryCache::with_clock(clock.clone());
        let continuation = FakeContinuation::new();
        let coordinator = JoinCoordinator::new(
            store.clone(),
            cache.clone(),
            continuation.clone(),
            EngineConfig::default(),
        );
        let driver = StepDriver::new(store.clone(), SequentialIdGen::new("job"));
        Self {
            store,
            cache,
            clock,
            continuation,
            coordinator,
            driver,
        }
    }

    /// Simulate a stage executor finishing: record its output on the job
    pub async fn finish_stage(&self, job_id: &JobId, stage: Stage) {
        self.store
            .update(
                job_id,
                ContextPatch::outputs(
                    StageOutputs::default().with(stage, json!({"from": stage.name()})),
                ),
            )
            .await
            .unwrap();
    }
}

/// A branch partial carrying only the given stage's output
pub fn partial(stage: Stage) -> StageOutputs {
    StageOutputs::default().with(stage, json!({"from": stage.name()}))
}
