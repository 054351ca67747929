//! The sequential execution state machine.
//!
//! An `ExecutionEngine` walks a `WorkflowGraph` one stage at a time:
//!
//! ```text
//! NotStarted -> Running(stage) -> Running(next) | Completed | Stalled
//! ```
//!
//! `Stalled` is not terminal. Resubmitting the current stage, swapping in a
//! graph with corrected guards, or jumping to a stage all resume the run.
//! Engines never share mutable state; several can run the same `Arc`'d graph.

use crate::error::ExecutionError;
use crate::graph::{Guard, Stage, StageForm, WorkflowGraph, inheritance};
use crate::value::{RawValues, Snapshots, StageValues};
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod state;
mod validation;

pub use state::{ExecutionState, ExecutionStatus, StageStatus, StallReason, classify};

/// What a successful submission did to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A transition was taken.
    Advanced {
        from: String,
        to: String,
        edge_id: String,
        /// Human-readable account of the guard that matched.
        reason: String,
    },
    /// The stage had no outgoing edges.
    Completed { stage_id: String },
    /// Outgoing edges exist but no guard matched. The snapshot was kept.
    Stalled { stage_id: String },
}

pub struct ExecutionEngine {
    graph: Arc<WorkflowGraph>,
    state: ExecutionState,
}

impl ExecutionEngine {
    /// Creates an engine in the `NotStarted` state.
    pub fn new(graph: Arc<WorkflowGraph>) -> Self {
        Self {
            graph,
            state: ExecutionState::new(),
        }
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn status(&self) -> &ExecutionStatus {
        &self.state.status
    }

    pub fn current_stage_id(&self) -> Option<&str> {
        self.state.current_stage_id.as_deref()
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.current_stage_id()
            .and_then(|id| self.graph.stage(id).ok())
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.state.snapshots
    }

    pub fn snapshot(&self, stage_id: &str) -> Option<&StageValues> {
        self.state.snapshots.get(stage_id)
    }

    /// Begins a run at `entry`, or at the only stage without incoming edges.
    ///
    /// Any previous snapshots are discarded.
    pub fn start(&mut self, entry: Option<&str>) -> Result<(), ExecutionError> {
        let entry = match entry {
            Some(id) => {
                if !self.graph.contains_stage(id) {
                    return Err(ExecutionError::UnknownStage(id.to_string()));
                }
                id.to_string()
            }
            None => {
                let candidates = self.graph.entry_candidates();
                match candidates.as_slice() {
                    [only] => only.to_string(),
                    _ => {
                        return Err(ExecutionError::AmbiguousEntryPoint {
                            candidates: candidates.iter().map(|id| id.to_string()).collect(),
                        });
                    }
                }
            }
        };

        info!(stage = %entry, "execution started");
        self.state = ExecutionState {
            current_stage_id: Some(entry),
            snapshots: Snapshots::new(),
            status: ExecutionStatus::Running,
        };
        Ok(())
    }

    /// Validates values for the current stage, records them and selects the next stage.
    ///
    /// Outgoing edges are tried in graph declaration order and the first whose
    /// guard holds for the submitted values wins; an unguarded edge always holds.
    /// On a validation error nothing changes. When no guard holds the engine
    /// stalls, but the stage's snapshot is kept.
    pub fn submit_stage_values(
        &mut self,
        raw: &RawValues,
    ) -> Result<StepOutcome, ExecutionError> {
        let stage_id = match (&self.state.status, &self.state.current_stage_id) {
            (ExecutionStatus::Running | ExecutionStatus::Stalled(_), Some(id)) => id.clone(),
            (status, _) => {
                return Err(ExecutionError::NotRunning {
                    status: status.clone(),
                });
            }
        };
        let graph = Arc::clone(&self.graph);
        let stage = graph
            .stage(&stage_id)
            .map_err(|_| ExecutionError::UnknownStage(stage_id.clone()))?;

        let values = validation::validate_submission(stage, raw)?;
        debug!(
            stage = %stage_id,
            fields = %values.keys().sorted().join(", "),
            "stage values accepted"
        );

        let mut has_outgoing = false;
        let mut selected = None;
        for edge in graph.outgoing_edges(&stage_id) {
            has_outgoing = true;
            let (matched, reason) = edge.guard.explain(&values);
            if let Guard::Unusable { .. } = edge.guard {
                warn!(edge = %edge.id, %reason, "skipping edge with unusable guard");
            } else {
                debug!(edge = %edge.id, matched, %reason, "guard evaluated");
            }
            if matched {
                selected = Some((edge, reason));
                break;
            }
        }

        self.state.snapshots.insert(stage_id.clone(), values);

        let outcome = match selected {
            Some((edge, reason)) => {
                debug!(from = %stage_id, to = %edge.target, edge = %edge.id, "transition taken");
                self.state.current_stage_id = Some(edge.target.clone());
                self.state.status = ExecutionStatus::Running;
                StepOutcome::Advanced {
                    from: stage_id,
                    to: edge.target.clone(),
                    edge_id: edge.id.clone(),
                    reason,
                }
            }
            None if !has_outgoing => {
                info!(stage = %stage_id, "execution completed");
                self.state.current_stage_id = None;
                self.state.status = ExecutionStatus::Completed;
                StepOutcome::Completed { stage_id }
            }
            None => {
                warn!(stage = %stage_id, "no outgoing guard matched, execution stalled");
                self.state.status = ExecutionStatus::Stalled(StallReason::NoMatchingTransition);
                StepOutcome::Stalled { stage_id }
            }
        };
        Ok(outcome)
    }

    /// Discards all snapshots and the active stage.
    pub fn reset(&mut self) {
        info!("execution reset");
        self.state = ExecutionState::new();
    }

    /// Makes `stage_id` the active stage without evaluating guards or
    /// touching recorded snapshots.
    pub fn jump_to(&mut self, stage_id: &str) -> Result<(), ExecutionError> {
        if !self.graph.contains_stage(stage_id) {
            return Err(ExecutionError::UnknownStage(stage_id.to_string()));
        }
        debug!(stage = stage_id, "jumped to stage");
        self.state.current_stage_id = Some(stage_id.to_string());
        self.state.status = ExecutionStatus::Running;
        Ok(())
    }

    /// Stage classification for display, recomputed from the current pointer.
    pub fn stage_statuses(&self) -> Vec<(&str, StageStatus)> {
        classify(&self.graph, self.current_stage_id())
    }

    /// The prefilled form for the active stage.
    pub fn current_form(&self) -> Option<StageForm> {
        self.current_stage()
            .map(|stage| inheritance::prefill(&self.graph, stage, &self.state.snapshots))
    }

    /// Swaps in a new graph, typically one with corrected guards, keeping the run.
    ///
    /// Fails if the active stage does not exist in the new graph.
    pub fn replace_graph(&mut self, graph: Arc<WorkflowGraph>) -> Result<(), ExecutionError> {
        if let Some(id) = self.current_stage_id() {
            if !graph.contains_stage(id) {
                return Err(ExecutionError::UnknownStage(id.to_string()));
            }
        }
        self.graph = graph;
        Ok(())
    }

    /// Replaces the whole state, e.g. with one loaded from a `SnapshotStore`.
    ///
    /// The state is checked against the graph first and the engine is left
    /// untouched if it does not fit.
    pub fn restore(&mut self, state: ExecutionState) -> Result<(), ExecutionError> {
        match (&state.status, state.current_stage_id.as_deref()) {
            (_, Some(id)) if !self.graph.contains_stage(id) => {
                return Err(ExecutionError::UnknownStage(id.to_string()));
            }
            (ExecutionStatus::Running | ExecutionStatus::Stalled(_), None) => {
                return Err(ExecutionError::NotRunning {
                    status: state.status.clone(),
                });
            }
            _ => {}
        }
        if let Some(unknown) = state
            .snapshots
            .keys()
            .find(|id| !self.graph.contains_stage(id.as_str()))
        {
            return Err(ExecutionError::UnknownStage(unknown.clone()));
        }

        info!(status = %state.status, "execution state restored");
        self.state = state;
        Ok(())
    }
}
