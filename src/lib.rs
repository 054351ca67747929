//! # Keiro - Stage-and-Transition Workflow Engine
//!
//! **Keiro** executes workflows drawn as graphs of stages. Each stage declares
//! the fields it collects, and each edge between stages may carry a small guard
//! such as `status == 'approved'` that decides whether the transition is taken.
//!
//! ## Core Workflow
//!
//! The engine operates on a canonical `WorkflowDefinition`. The primary workflow is:
//!
//! 1.  **Load Your Data**: Read a canonical `{stages, edges}` document or an editor save file with `load_document`, or implement `IntoWorkflow` for your own format.
//! 2.  **Build the Graph**: `WorkflowGraph::builder` validates references and compiles every guard against its source stage's fields.
//! 3.  **Execute**: Share the graph through an `Arc` and drive one `ExecutionEngine` per run, submitting values stage by stage.
//! 4.  **Persist**: Hand the engine's `ExecutionState` to a `SnapshotStore` to pick the run up later.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let definition = WorkflowDefinition {
//!         stages: vec![
//!             Stage::new("review", "Review")
//!                 .with_output(Field::new("f1", "status", FieldType::String).required()),
//!             Stage::new("approved", "Approved"),
//!             Stage::new("rework", "Rework"),
//!         ],
//!         edges: vec![
//!             EdgeDefinition::new("e1", "review", "approved").with_guard("status == 'ok'"),
//!             EdgeDefinition::new("e2", "review", "rework"),
//!         ],
//!     };
//!
//!     let graph = Arc::new(WorkflowGraph::builder(definition).build()?);
//!     let mut engine = ExecutionEngine::new(graph);
//!     engine.start(None)?;
//!
//!     let mut values = RawValues::new();
//!     values.insert("status".to_string(), serde_json::json!("ok"));
//!
//!     match engine.submit_stage_values(&values)? {
//!         StepOutcome::Advanced { to, reason, .. } => println!("-> {} ({})", to, reason),
//!         other => println!("-> {:?}", other),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod model;
pub mod prelude;
pub mod store;
pub mod value;
