//! Common test utilities for building workflow definitions and submissions.
use keiro::prelude::*;
use std::sync::Arc;

/// A review stage with a guarded edge and a fallback edge.
///
/// Logic: `A --[status == 'ok']--> B`, `A --[always]--> C`
#[allow(dead_code)]
pub fn create_review_flow() -> WorkflowDefinition {
    WorkflowDefinition {
        stages: vec![
            Stage::new("A", "Review")
                .with_output(Field::new("f_status", "status", FieldType::String).required())
                .with_output(Field::new("f_notes", "notes", FieldType::String)),
            Stage::new("B", "Approved"),
            Stage::new("C", "Rework"),
        ],
        edges: vec![
            EdgeDefinition::new("e_ok", "A", "B").with_guard("status == 'ok'"),
            EdgeDefinition::new("e_fallback", "A", "C"),
        ],
    }
}

/// A draft/review loop with two guarded exits from review and no entry stage.
///
/// Logic: `draft -> review`, `review --[decision == 'rework']--> draft`,
/// `review --[decision == 'accept']--> done`
#[allow(dead_code)]
pub fn create_loop_flow() -> WorkflowDefinition {
    WorkflowDefinition {
        stages: vec![
            Stage::new("draft", "Draft")
                .with_output(Field::new("f_text", "text", FieldType::String).required()),
            Stage::new("review", "Review")
                .with_output(Field::new("f_decision", "decision", FieldType::String).required()),
            Stage::new("done", "Done"),
        ],
        edges: vec![
            EdgeDefinition::new("l1", "draft", "review"),
            EdgeDefinition::new("l2", "review", "draft").with_guard("decision == 'rework'"),
            EdgeDefinition::new("l3", "review", "done").with_guard("decision == 'accept'"),
        ],
    }
}

/// A diamond where the bottom stage inherits from two upstream stages.
///
/// Logic: `top -> left -> bottom`, `top -> right -> bottom`
#[allow(dead_code)]
pub fn create_diamond_flow() -> WorkflowDefinition {
    WorkflowDefinition {
        stages: vec![
            Stage::new("top", "Intake")
                .with_input(Field::new("f_customer", "customer", FieldType::String).required())
                .with_output(Field::new("f_amount", "amount", FieldType::Number)),
            Stage::new("left", "Credit check")
                .with_output(Field::new("f_score", "score", FieldType::Number)),
            Stage::new("right", "Fraud check")
                .with_output(Field::new("f_flagged", "flagged", FieldType::Boolean)),
            Stage::new("bottom", "Decision")
                .with_input(
                    Field::new("f_amount_in", "amount", FieldType::Number)
                        .with_source("top", "f_amount"),
                )
                .with_input(
                    Field::new("f_flag_in", "fraud flag", FieldType::Boolean)
                        .with_source("right", "f_flagged"),
                )
                .with_output(Field::new("f_result", "result", FieldType::String)),
        ],
        edges: vec![
            EdgeDefinition::new("d1", "top", "left"),
            EdgeDefinition::new("d2", "top", "right"),
            EdgeDefinition::new("d3", "left", "bottom"),
            EdgeDefinition::new("d4", "right", "bottom"),
        ],
    }
}

/// Builds a shareable graph, panicking on an invalid fixture.
#[allow(dead_code)]
pub fn build(definition: WorkflowDefinition) -> Arc<WorkflowGraph> {
    Arc::new(WorkflowGraph::from_definition(definition).expect("fixture should build"))
}

/// Creates a started engine over `definition`.
#[allow(dead_code)]
pub fn started_engine(definition: WorkflowDefinition, entry: Option<&str>) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new(build(definition));
    engine.start(entry).expect("fixture should start");
    engine
}

/// Builds a raw submission from `(field name, JSON value)` pairs.
#[allow(dead_code)]
pub fn raw(pairs: &[(&str, serde_json::Value)]) -> RawValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Builds typed stage values from `(field name, value)` pairs.
#[allow(dead_code)]
pub fn values(pairs: &[(&str, Value)]) -> StageValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
