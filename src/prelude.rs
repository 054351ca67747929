//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the keiro crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let graph = WorkflowGraph::from_definition(load_document(&json)?)?;
//!
//! let mut engine = ExecutionEngine::new(Arc::new(graph));
//! let mut store = FileSnapshotStore::new("path/to/run.state");
//! match store.load()? {
//!     Some(state) => engine.restore(state)?,
//!     None => engine.start(None)?,
//! }
//!
//! println!("Current stage: {:?}", engine.current_stage_id());
//! store.save(engine.state())?;
//! # Ok(())
//! # }
//! ```

// Graph model and construction
pub use crate::graph::{
    Edge, Field, FieldType, GraphBuilder, Guard, GuardPolicy, HeritableField, SourceRef, Stage,
    StageForm, WorkflowGraph,
};

// Field inheritance
pub use crate::graph::inheritance::{adopt, heritable_fields, prefill};

// Guards
pub use crate::condition::{Condition, Literal, Operator};

// Execution
pub use crate::engine::{
    ExecutionEngine, ExecutionState, ExecutionStatus, StageStatus, StallReason, StepOutcome,
};

// Document formats
pub use crate::model::{
    EdgeDefinition, EditorDocument, IntoWorkflow, WorkflowDefinition, load_document,
};

// Error types
pub use crate::error::{
    ConditionParseError, ExecutionError, GraphError, StoreError, ValidationIssue,
};

// Values
pub use crate::value::{RawValues, Snapshots, StageValues, Value};

// Id generation
pub use crate::ids::{IdGenerator, RandomIds, SequentialIds};

// Persistence
pub use crate::store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
