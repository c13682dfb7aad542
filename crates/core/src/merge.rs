// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed merging of partial stage outputs
//!
//! The two join branches are expected to contribute disjoint fields, so the
//! merge is a field-union over the known schema. An overlap with identical
//! values collapses silently, which keeps replayed deliveries idempotent.
//! An overlap with differing values is a conflict error, never a silent
//! precedence pick.

use crate::context::StageOutputs;
use crate::stage::Stage;
use thiserror::Error;

/// Both partials populated the same field with different values
#[derive(Debug, Clone, Error, PartialEq)]
#[error("conflicting output for stage {stage}")]
pub struct MergeConflict {
    pub stage: Stage,
}

/// Field-union of two partial outputs.
///
/// Commutative on disjoint fields: the arrival order of the two branches
/// does not change the result.
pub fn merge_outputs(
    first: &StageOutputs,
    second: &StageOutputs,
) -> Result<StageOutputs, MergeConflict> {
    let mut merged = StageOutputs::default();
    for stage in Stage::PRECEDENCE {
        let value = match (first.get(stage), second.get(stage)) {
            (None, None) => None,
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(_), Some(_)) => return Err(MergeConflict { stage }),
        };
        if let Some(value) = value {
            merged.set(stage, value);
        }
    }
    Ok(merged)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
