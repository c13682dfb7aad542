// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory rendezvous cache with lazy TTL expiry

use super::{CacheError, PartialRecord, RendezvousCache, RendezvousKey};
use async_trait::async_trait;
use fab_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry {
    record: PartialRecord,
    expires_at: Instant,
}

/// Mutex-guarded map; check-and-set and check-and-delete hold the lock for
/// their whole check-then-write, so they are atomic with respect to each
/// other. Expiry is evaluated lazily on access against the injected clock.
#[derive(Clone)]
pub struct MemoryCache<C: Clock = SystemClock> {
    entries: Arc<Mutex<HashMap<RendezvousKey, Entry>>>,
    clock: C,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of live entries; expired entries do not count
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<C: Clock> RendezvousCache for MemoryCache<C> {
    async fn set_if_absent(
        &self,
        key: &RendezvousKey,
        record: PartialRecord,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(false);
            }
            tracing::debug!(key = %key, "expired rendezvous entry replaced");
        }
        entries.insert(
            key.clone(),
            Entry {
                record,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn take(&self, key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.remove(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.record)),
            Some(_) => {
                tracing::debug!(key = %key, "rendezvous entry expired before its sibling arrived");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get(&self, key: &RendezvousKey) -> Result<Option<PartialRecord>, CacheError> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.record.clone()))
    }

    async fn delete(&self, key: &RendezvousKey) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
