// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline stages and the pure stage dispatcher
//!
//! The dispatcher is a pure function over the build context: no side
//! effects, no I/O, so it is safe to call speculatively and trivial to test.

use crate::context::BuildContext;
use serde::{Deserialize, Serialize};

/// One generation stage of the artifact pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Input/output shape of the requested tool
    Signatures,
    /// State logic wiring
    Logic,
    /// Layout tree
    Layout,
    /// Visual styling
    Styling,
    /// Final artifact assembly
    Assembly,
}

impl Stage {
    /// Dispatch precedence: the first stage with an absent output runs next
    pub const PRECEDENCE: [Stage; 5] = [
        Stage::Signatures,
        Stage::Logic,
        Stage::Layout,
        Stage::Styling,
        Stage::Assembly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Signatures => "signatures",
            Stage::Logic => "logic",
            Stage::Layout => "layout",
            Stage::Styling => "styling",
            Stage::Assembly => "assembly",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decision produced by the stage dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageDecision {
    /// Run the named stage next
    Run(Stage),
    /// Every required output is populated
    Completed,
}

impl StageDecision {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StageDecision::Run(stage) => Some(*stage),
            StageDecision::Completed => None,
        }
    }
}

/// The single fan-out point of the pipeline
///
/// After signatures, logic and layout execute as independent branches and
/// rendezvous here before styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPoint {
    /// Stable identifier, part of the rendezvous cache key
    pub id: &'static str,
    /// The two branches that must both report
    pub branches: [Stage; 2],
    /// Single-branch execution resumes here after the merge
    pub resume: Stage,
}

impl JoinPoint {
    /// Check whether a stage is one of this join point's branches
    pub fn has_branch(&self, stage: Stage) -> bool {
        self.branches.contains(&stage)
    }
}

/// The logic/layout rendezvous before styling
pub const JOIN_LOGIC_LAYOUT: JoinPoint = JoinPoint {
    id: "logic-layout",
    branches: [Stage::Logic, Stage::Layout],
    resume: Stage::Styling,
};

/// Compute the next stage for a build context.
///
/// Pure, total, deterministic: walks the fixed precedence list and returns
/// the first stage whose output is still absent, or `Completed` when every
/// output is present.
pub fn next_stage(context: &BuildContext) -> StageDecision {
    for stage in Stage::PRECEDENCE {
        if context.outputs.get(stage).is_none() {
            return StageDecision::Run(stage);
        }
    }
    StageDecision::Completed
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
