// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full pipeline specs
//!
//! Walk a job from submission to completion through the fan-out and join.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn job_walks_the_whole_pipeline() {
    let h = Harness::new();

    // submit → pending
    let job = h.driver.submit("a currency converter").await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    // first step dispatches signatures
    let outcome = h.driver.step_forward(&job.id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Next(Stage::Signatures));
    h.finish_stage(&job.id, Stage::Signatures).await;

    // the dispatcher now points at the fan-out segment
    let outcome = h.driver.step_forward(&job.id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Next(Stage::Logic));

    // both branches run concurrently and report through the coordinator
    let first = h
        .coordinator
        .check_completion(&job.id, partial(Stage::Logic))
        .await
        .unwrap();
    assert_eq!(first, JoinOutcome::Waiting);

    let second = h
        .coordinator
        .check_completion(&job.id, partial(Stage::Layout))
        .await
        .unwrap();
    let merged = match second {
        JoinOutcome::Merged { context } => context,
        JoinOutcome::Waiting => panic!("sibling should have merged"),
    };
    assert_eq!(merged.current_stage, Some(Stage::Styling));

    // the join triggered styling exactly once; the driver never triggers
    assert_eq!(h.continuation.calls().len(), 1);
    assert_eq!(h.continuation.calls()[0].stage, Stage::Styling);

    // styling and assembly finish single-branch
    h.finish_stage(&job.id, Stage::Styling).await;
    let outcome = h.driver.step_forward(&job.id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Next(Stage::Assembly));
    h.finish_stage(&job.id, Stage::Assembly).await;

    let outcome = h.driver.step_forward(&job.id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Completed);

    let finished = h.store.get(&job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.outputs.populated().len(), 5);
}

#[tokio::test]
async fn stage_outputs_accumulate_append_only() {
    let h = Harness::new();
    let job = h.driver.submit("a currency converter").await.unwrap();
    h.driver.step_forward(&job.id).await.unwrap();
    h.finish_stage(&job.id, Stage::Signatures).await;

    let before = h.store.get(&job.id).await.unwrap().unwrap();

    // a stage trying to overwrite an earlier output is rejected
    let err = h
        .store
        .update(
            &job.id,
            ContextPatch::outputs(
                StageOutputs::default().with(Stage::Signatures, json!("rewritten")),
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, fab_storage::StoreError::Context(_)));

    let after = h.store.get(&job.id).await.unwrap().unwrap();
    assert_eq!(after.outputs, before.outputs);
}

#[tokio::test]
async fn two_jobs_progress_independently() {
    let h = Harness::new();
    let one = h.driver.submit("a currency converter").await.unwrap();
    let two = h.driver.submit("a qr code maker").await.unwrap();

    h.driver.step_forward(&one.id).await.unwrap();
    h.finish_stage(&one.id, Stage::Signatures).await;
    h.coordinator
        .check_completion(&one.id, partial(Stage::Logic))
        .await
        .unwrap();

    // job two is untouched by job one's rendezvous
    let stored = h.store.get(&two.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(h.cache.len(), 1);

    h.driver.step_forward(&two.id).await.unwrap();
    h.finish_stage(&two.id, Stage::Signatures).await;
    h.coordinator
        .check_completion(&two.id, partial(Stage::Layout))
        .await
        .unwrap();

    // each job holds its own slot
    assert_eq!(h.cache.len(), 2);
}
