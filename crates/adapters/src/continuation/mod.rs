// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget continuation dispatch
//!
//! Hands a context to the next stage's entrypoint without blocking the
//! caller. The contract is enqueue-and-forget: success means the invocation
//! was accepted, not that the stage ran. At-most-once; there is no
//! redelivery, so a durable queue belongs behind this seam for
//! production-grade delivery guarantees.

mod queue;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use queue::QueuedContinuation;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeContinuation;

use async_trait::async_trait;
use fab_core::{BuildContext, Stage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContinuationError {
    #[error("continuation queue closed")]
    QueueClosed,
}

/// One stage execution hand-off
#[derive(Debug, Clone)]
pub struct StageInvocation {
    pub stage: Stage,
    pub context: BuildContext,
}

impl StageInvocation {
    pub fn new(stage: Stage, context: BuildContext) -> Self {
        Self { stage, context }
    }
}

/// Dispatch seam for invoking a stage's entrypoint
#[async_trait]
pub trait ContinuationDispatch: Send + Sync {
    /// Enqueue the invocation. Success means enqueued, not executed.
    async fn invoke(&self, invocation: StageInvocation) -> Result<(), ContinuationError>;
}

/// Dispatch that drops every invocation
#[derive(Clone, Default)]
pub struct NoOpContinuation;

impl NoOpContinuation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContinuationDispatch for NoOpContinuation {
    async fn invoke(&self, _invocation: StageInvocation) -> Result<(), ContinuationError> {
        Ok(())
    }
}
