// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build context document and job status state machine
//!
//! One build context exists per job. It is owned exclusively by the
//! orchestration layer; stage executors only ever receive a copy and hand
//! back a delta (`ContextPatch`). Status changes go through an enumerated
//! transition table, and stage outputs are append-only within a job run.

use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Unique identifier for a build job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

/// Lifecycle status of a build job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    WaitingForParallelCompletion,
    Completed,
    Failed,
}

impl JobStatus {
    /// Enumerated transition table; anything not listed is rejected.
    /// `waiting_for_parallel_completion` is entered only at the fan-out
    /// point and left exactly once, by the second branch's join call or a
    /// manual re-step.
    const TRANSITIONS: [(JobStatus, JobStatus); 5] = [
        (JobStatus::Pending, JobStatus::InProgress),
        (JobStatus::InProgress, JobStatus::WaitingForParallelCompletion),
        (JobStatus::WaitingForParallelCompletion, JobStatus::InProgress),
        (JobStatus::InProgress, JobStatus::Completed),
        (JobStatus::InProgress, JobStatus::Failed),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::WaitingForParallelCompletion => "waiting_for_parallel_completion",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check whether a transition is in the table
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors raised when mutating a build context
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContextError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("stage output already populated: {0}")]
    OutputAlreadyPopulated(Stage),
}

/// Per-stage outputs of a build job
///
/// Each field is absent until its stage's agent produces it. The schema is
/// deliberately typed per stage rather than a free-form map, so merge rules
/// can be explicit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<Value>,
}

impl StageOutputs {
    pub fn get(&self, stage: Stage) -> Option<&Value> {
        match stage {
            Stage::Signatures => self.signatures.as_ref(),
            Stage::Logic => self.logic.as_ref(),
            Stage::Layout => self.layout.as_ref(),
            Stage::Styling => self.styling.as_ref(),
            Stage::Assembly => self.assembly.as_ref(),
        }
    }

    pub fn set(&mut self, stage: Stage, value: Value) {
        let slot = match stage {
            Stage::Signatures => &mut self.signatures,
            Stage::Logic => &mut self.logic,
            Stage::Layout => &mut self.layout,
            Stage::Styling => &mut self.styling,
            Stage::Assembly => &mut self.assembly,
        };
        *slot = Some(value);
    }

    /// Builder-style set, handy for patches and tests
    pub fn with(mut self, stage: Stage, value: Value) -> Self {
        self.set(stage, value);
        self
    }

    /// Stages with a populated output, in precedence order
    pub fn populated(&self) -> Vec<Stage> {
        Stage::PRECEDENCE
            .iter()
            .copied()
            .filter(|stage| self.get(*stage).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated().is_empty()
    }
}

/// The evolving document describing one in-flight generation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildContext {
    pub id: JobId,
    /// The user's tool request, captured at submission
    pub request: String,
    pub status: JobStatus,
    /// Stage currently (or most recently) dispatched; None before the first step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<Stage>,
    #[serde(default)]
    pub outputs: StageOutputs,
    /// Failure reason when status is failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BuildContext {
    /// Create a new context in `pending`
    pub fn new(id: impl Into<JobId>, request: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            request: request.into(),
            status: JobStatus::Pending,
            current_stage: None,
            outputs: StageOutputs::default(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch, enforcing the status transition table and the
    /// append-only invariant on stage outputs.
    ///
    /// Validation happens before any field is touched, so a rejected patch
    /// leaves the context unchanged. Re-applying an identical output or the
    /// current status is a no-op, which keeps replays idempotent.
    pub fn apply(&mut self, patch: ContextPatch) -> Result<(), ContextError> {
        if let Some(next) = patch.status {
            if next != self.status && !self.status.can_transition_to(next) {
                return Err(ContextError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
        }

        let mut additions: Vec<(Stage, Value)> = Vec::new();
        for stage in patch.outputs.populated() {
            match (self.outputs.get(stage), patch.outputs.get(stage)) {
                (Some(existing), Some(incoming)) if existing == incoming => {}
                (Some(_), Some(_)) => {
                    return Err(ContextError::OutputAlreadyPopulated(stage));
                }
                (None, Some(incoming)) => additions.push((stage, incoming.clone())),
                (_, None) => {}
            }
        }

        if let Some(next) = patch.status {
            self.status = next;
        }
        for (stage, value) in additions {
            self.outputs.set(stage, value);
        }
        if let Some(stage) = patch.current_stage {
            self.current_stage = Some(stage);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A delta applied to a build context by the orchestration layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<Stage>,
    #[serde(default)]
    pub outputs: StageOutputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContextPatch {
    /// Patch that only changes the job status
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch that only contributes stage outputs
    pub fn outputs(outputs: StageOutputs) -> Self {
        Self {
            outputs,
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.current_stage = Some(stage);
        self
    }

    pub fn with_outputs(mut self, outputs: StageOutputs) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
