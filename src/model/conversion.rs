use super::definition::WorkflowDefinition;
use crate::error::GraphError;

/// A trait for custom data models that can be converted into a `WorkflowDefinition`.
///
/// Implement it on the structs of whatever format workflows are stored in, and
/// the result can be handed to `WorkflowGraph::builder`.
///
/// # Example
///
/// ```rust,no_run
/// use keiro::prelude::*;
///
/// struct Checklist { steps: Vec<String> }
///
/// impl IntoWorkflow for Checklist {
///     fn into_workflow(self) -> Result<WorkflowDefinition, GraphError> {
///         let stages: Vec<Stage> = self
///             .steps
///             .iter()
///             .enumerate()
///             .map(|(i, label)| Stage::new(&format!("step_{}", i), label))
///             .collect();
///         let edges = stages
///             .windows(2)
///             .enumerate()
///             .map(|(i, pair)| EdgeDefinition::new(&format!("e{}", i), &pair[0].id, &pair[1].id))
///             .collect();
///         Ok(WorkflowDefinition { stages, edges })
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a workflow definition.
    fn into_workflow(self) -> Result<WorkflowDefinition, GraphError>;
}

impl IntoWorkflow for WorkflowDefinition {
    fn into_workflow(self) -> Result<WorkflowDefinition, GraphError> {
        Ok(self)
    }
}
