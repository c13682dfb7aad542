// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Continuation trigger
//!
//! Fires the next stage after a successful join. A dispatch failure is
//! logged and swallowed: the join already succeeded on its own terms, and
//! downstream delivery is a separate concern. At-most-once per merge; kept
//! structurally apart from the merge logic so the two are testable in
//! isolation.

use fab_adapters::{ContinuationDispatch, StageInvocation};
use fab_core::{BuildContext, Stage};
use tracing::{debug, warn};

pub struct ContinuationTrigger<D> {
    dispatch: D,
}

impl<D: ContinuationDispatch> ContinuationTrigger<D> {
    pub fn new(dispatch: D) -> Self {
        Self { dispatch }
    }

    /// Hand the context to the next stage's entrypoint
    pub async fn fire(&self, stage: Stage, context: &BuildContext) {
        let invocation = StageInvocation::new(stage, context.clone());
        match self.dispatch.invoke(invocation).await {
            Ok(()) => debug!(job = %context.id, stage = %stage, "continuation dispatched"),
            Err(err) => warn!(
                job = %context.id,
                stage = %stage,
                error = %err,
                "continuation dispatch failed, pipeline will not advance on its own"
            ),
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
