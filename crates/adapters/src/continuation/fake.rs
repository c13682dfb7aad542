// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake continuation dispatch for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ContinuationDispatch, ContinuationError, StageInvocation};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records every invocation; can be switched to fail enqueueing
#[derive(Clone, Default)]
pub struct FakeContinuation {
    calls: Arc<Mutex<Vec<StageInvocation>>>,
    failing: Arc<AtomicBool>,
}

impl FakeContinuation {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded invocations
    pub fn calls(&self) -> Vec<StageInvocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make subsequent invokes fail as if the queue were closed
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContinuationDispatch for FakeContinuation {
    async fn invoke(&self, invocation: StageInvocation) -> Result<(), ContinuationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContinuationError::QueueClosed);
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
