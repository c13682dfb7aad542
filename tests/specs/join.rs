// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Join coordination specs
//!
//! Exactly-once merging across interleavings, TTL expiry, and validation.

use crate::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Set up a job sitting at the fan-out point
async fn job_at_fan_out(h: &Harness) -> JobId {
    let job = h.driver.submit("a habit tracker").await.unwrap();
    h.driver.step_forward(&job.id).await.unwrap();
    h.finish_stage(&job.id, Stage::Signatures).await;
    h.driver.step_forward(&job.id).await.unwrap();
    job.id
}

#[tokio::test]
async fn exactly_one_merge_in_either_order() {
    for branches in [
        [Stage::Logic, Stage::Layout],
        [Stage::Layout, Stage::Logic],
    ] {
        let h = Harness::new();
        let job_id = job_at_fan_out(&h).await;

        let first = h
            .coordinator
            .check_completion(&job_id, partial(branches[0]))
            .await
            .unwrap();
        let second = h
            .coordinator
            .check_completion(&job_id, partial(branches[1]))
            .await
            .unwrap();

        assert_eq!(first, JoinOutcome::Waiting);
        assert!(matches!(second, JoinOutcome::Merged { .. }));
        assert_eq!(h.continuation.calls().len(), 1);
        assert!(h.cache.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_arrivals_merge_exactly_once() {
    let h = Harness::new();
    let job_id = job_at_fan_out(&h).await;
    let coordinator = Arc::new(JoinCoordinator::new(
        h.store.clone(),
        h.cache.clone(),
        h.continuation.clone(),
        EngineConfig::default(),
    ));

    let logic = {
        let coordinator = Arc::clone(&coordinator);
        let job_id = job_id.clone();
        tokio::spawn(async move {
            coordinator
                .check_completion(&job_id, partial(Stage::Logic))
                .await
                .unwrap()
        })
    };
    let layout = {
        let coordinator = Arc::clone(&coordinator);
        let job_id = job_id.clone();
        tokio::spawn(async move {
            coordinator
                .check_completion(&job_id, partial(Stage::Layout))
                .await
                .unwrap()
        })
    };

    let outcomes = [logic.await.unwrap(), layout.await.unwrap()];

    let merges = outcomes
        .iter()
        .filter(|o| matches!(o, JoinOutcome::Merged { .. }))
        .count();
    let waits = outcomes
        .iter()
        .filter(|o| matches!(o, JoinOutcome::Waiting))
        .count();
    assert_eq!((merges, waits), (1, 1));
    assert_eq!(h.continuation.calls().len(), 1);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn late_sibling_after_ttl_restarts_the_rendezvous() {
    let h = Harness::new();
    let job_id = job_at_fan_out(&h).await;

    h.coordinator
        .check_completion(&job_id, partial(Stage::Logic))
        .await
        .unwrap();

    // the parked partial self-expires before the sibling shows up
    h.clock
        .advance(EngineConfig::default().partial_ttl + Duration::from_secs(1));

    let outcome = h
        .coordinator
        .check_completion(&job_id, partial(Stage::Layout))
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Waiting);

    // the first branch retries and the join completes on the new slot
    let outcome = h
        .coordinator
        .check_completion(&job_id, partial(Stage::Logic))
        .await
        .unwrap();
    assert!(matches!(outcome, JoinOutcome::Merged { .. }));
    assert_eq!(h.continuation.calls().len(), 1);
}

#[tokio::test]
async fn malformed_partial_changes_nothing() {
    let h = Harness::new();
    let job_id = job_at_fan_out(&h).await;
    let before = h.store.get(&job_id).await.unwrap().unwrap();

    let err = h
        .coordinator
        .check_completion(&job_id, StageOutputs::default())
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    assert!(h.cache.is_empty());
    assert_eq!(h.store.get(&job_id).await.unwrap().unwrap(), before);
    assert!(h.continuation.calls().is_empty());
}

#[tokio::test]
async fn stalled_job_can_be_re_stepped() {
    let h = Harness::new();
    let job_id = job_at_fan_out(&h).await;

    h.coordinator
        .check_completion(&job_id, partial(Stage::Logic))
        .await
        .unwrap();
    h.clock
        .advance(EngineConfig::default().partial_ttl + Duration::from_secs(1));

    // the sibling never arrives; an operator re-steps the job
    let stored = h.store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::WaitingForParallelCompletion);

    let outcome = h.driver.step_forward(&job_id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Next(Stage::Logic));
    let stored = h.store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::InProgress);
}
