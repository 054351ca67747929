use crate::error::GraphError;
use crate::graph::Stage;
use serde::{Deserialize, Serialize};

/// The canonical, serializable description of a workflow.
///
/// This is the editable form. Build a `WorkflowGraph` from it to validate the
/// references and compile the guards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

/// A transition as written in the definition. `label`, when set, holds the guard text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl EdgeDefinition {
    pub fn new(id: &str, source: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            label: None,
        }
    }

    pub fn with_guard(mut self, guard: &str) -> Self {
        self.label = Some(guard.to_string());
        self
    }
}

impl WorkflowDefinition {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Json(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Json(e.to_string()))
    }
}
