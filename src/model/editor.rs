use super::conversion::IntoWorkflow;
use super::definition::{EdgeDefinition, WorkflowDefinition};
use crate::error::GraphError;
use crate::graph::{Field, Stage};
use serde::Deserialize;

/// Stage payload of an editor node.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorNodeData {
    pub label: String,
    #[serde(default)]
    pub inputs: Vec<Field>,
    #[serde(default)]
    pub outputs: Vec<Field>,
}

/// A canvas node. Position, node type and display status are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorNode {
    pub id: String,
    pub data: EditorNodeData,
}

/// A canvas connection; `label` carries the guard text.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// The document the graphical editor saves.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorDocument {
    pub nodes: Vec<EditorNode>,
    pub edges: Vec<EditorEdge>,
}

impl EditorDocument {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Json(e.to_string()))
    }
}

impl IntoWorkflow for EditorDocument {
    fn into_workflow(self) -> Result<WorkflowDefinition, GraphError> {
        let stages = self
            .nodes
            .into_iter()
            .map(|node| Stage {
                id: node.id,
                label: node.data.label,
                inputs: node.data.inputs,
                outputs: node.data.outputs,
            })
            .collect();

        let edges = self
            .edges
            .into_iter()
            .map(|edge| EdgeDefinition {
                id: edge.id,
                source: edge.source,
                target: edge.target,
                label: edge.label,
            })
            .collect();

        Ok(WorkflowDefinition { stages, edges })
    }
}

/// Reads either the canonical `{stages, edges}` schema or an editor document.
pub fn load_document(json: &str) -> Result<WorkflowDefinition, GraphError> {
    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| GraphError::Json(e.to_string()))?;
    if raw.get("nodes").is_some() {
        serde_json::from_value::<EditorDocument>(raw)
            .map_err(|e| GraphError::Json(e.to_string()))?
            .into_workflow()
    } else {
        serde_json::from_value(raw).map_err(|e| GraphError::Json(e.to_string()))
    }
}
