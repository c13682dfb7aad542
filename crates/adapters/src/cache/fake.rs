// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failing cache for backend-error tests
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CacheError, PartialRecord, RendezvousCache, RendezvousKey};
use async_trait::async_trait;
use std::time::Duration;

/// Cache that reports the backend unavailable on every operation
#[derive(Clone, Default)]
pub struct FailingCache;

impl FailingCache {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> CacheError {
        CacheError::Unavailable("injected failure".to_string())
    }
}

#[async_trait]
impl RendezvousCache for FailingCache {
    async fn set_if_absent(
        &self,
        _key: &RendezvousKey,
        _record: PartialRecord,
        _ttl: Duration,
    ) -> Result<bool, CacheError> {
        Err(Self::unavailable())
    }

    async fn take(&self, _key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError> {
        Err(Self::unavailable())
    }

    async fn get(&self, _key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _key: &RendezvousKey) -> Result<(), CacheError> {
        Err(Self::unavailable())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
