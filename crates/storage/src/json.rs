// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-backed job store
//!
//! Each job lives in `jobs/<id>.json` under the base directory.

use crate::error::StoreError;
use crate::store::JobStore;
use async_trait::async_trait;
use fab_core::{BuildContext, ContextPatch, JobId};
use std::fs;
use std::path::PathBuf;

/// JSON file-backed job store
#[derive(Clone)]
pub struct JsonJobStore {
    base_path: PathBuf,
}

impl JsonJobStore {
    /// Open a store at the given path, creating the layout if needed
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(base_path.join("jobs"))?;
        Ok(Self { base_path })
    }

    fn path_for(&self, id: &JobId) -> PathBuf {
        self.base_path.join("jobs").join(format!("{}.json", id))
    }

    fn read(&self, id: &JobId) -> Result<Option<BuildContext>, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write(&self, context: &BuildContext) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(context)?;
        fs::write(self.path_for(&context.id), json)?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for JsonJobStore {
    async fn create(&self, context: BuildContext) -> Result<(), StoreError> {
        if self.path_for(&context.id).exists() {
            return Err(StoreError::AlreadyExists(context.id.to_string()));
        }
        self.write(&context)
    }

    async fn get(&self, id: &JobId) -> Result<Option<BuildContext>, StoreError> {
        self.read(id)
    }

    async fn update(&self, id: &JobId, patch: ContextPatch) -> Result<BuildContext, StoreError> {
        let mut context = self
            .read(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        context.apply(patch)?;
        self.write(&context)?;
        Ok(context)
    }

    async fn list(&self) -> Result<Vec<JobId>, StoreError> {
        let dir = self.base_path.join("jobs");
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    ids.push(JobId::from(stem.to_string_lossy().to_string()));
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
