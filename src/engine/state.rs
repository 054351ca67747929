use crate::graph::{WorkflowGraph, ancestors_of};
use crate::value::Snapshots;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a running execution cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallReason {
    /// The stage has outgoing edges but none of their guards matched.
    NoMatchingTransition,
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StallReason::NoMatchingTransition => write!(f, "no matching transition"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    /// Recoverable: resubmitting or jumping resumes `Running`.
    Stalled(StallReason),
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::NotStarted => write!(f, "not started"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Stalled(reason) => write!(f, "stalled ({})", reason),
        }
    }
}

/// Everything an execution owns: the active stage and the recorded snapshots.
///
/// This is the unit handed to a `SnapshotStore`, and restoring it replaces the
/// engine's state as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub current_stage_id: Option<String>,
    pub snapshots: Snapshots,
    pub status: ExecutionStatus,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Display classification of a stage relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Current,
    Completed,
    Locked,
}

/// Classifies every stage, in declaration order: the active stage is `Current`,
/// its ancestors are `Completed`, everything else is `Locked`.
pub fn classify<'g>(
    graph: &'g WorkflowGraph,
    current: Option<&str>,
) -> Vec<(&'g str, StageStatus)> {
    let ancestors = current
        .map(|id| ancestors_of(graph, id))
        .unwrap_or_default();

    graph
        .stages()
        .iter()
        .map(|stage| {
            let status = if Some(stage.id.as_str()) == current {
                StageStatus::Current
            } else if ancestors.contains(stage.id.as_str()) {
                StageStatus::Completed
            } else {
                StageStatus::Locked
            };
            (stage.id.as_str(), status)
        })
        .collect()
}
