// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue-backed continuation dispatch

use super::{ContinuationDispatch, ContinuationError, StageInvocation};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Hands invocations to a consumer task over an unbounded channel.
///
/// The stage executor drains the receiver half. Enqueueing fails only when
/// the consumer is gone, which the caller logs and otherwise ignores.
#[derive(Clone)]
pub struct QueuedContinuation {
    sender: mpsc::UnboundedSender<StageInvocation>,
}

impl QueuedContinuation {
    /// Create the dispatch half and the receiver the executor drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StageInvocation>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ContinuationDispatch for QueuedContinuation {
    async fn invoke(&self, invocation: StageInvocation) -> Result<(), ContinuationError> {
        self.sender
            .send(invocation)
            .map_err(|_| ContinuationError::QueueClosed)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
