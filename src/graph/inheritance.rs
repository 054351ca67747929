use super::{Field, FieldType, Stage, WorkflowGraph, ancestors_of};
use crate::error::GraphError;
use crate::ids::IdGenerator;
use crate::value::{Snapshots, StageValues, Value};
use ahash::AHashSet;
use serde::Serialize;

/// A field exposed by an upstream stage that a downstream stage may adopt as an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeritableField {
    pub field_id: String,
    pub field_name: String,
    pub field_type: FieldType,
    pub origin_stage_id: String,
    pub origin_stage_label: String,
}

/// Lists the inputs and outputs of every ancestor of `stage_id`.
///
/// Ancestors are visited in stage declaration order, inputs before outputs, so
/// the list is stable for an unchanged graph.
pub fn heritable_fields(graph: &WorkflowGraph, stage_id: &str) -> Vec<HeritableField> {
    let ancestors = ancestors_of(graph, stage_id);
    graph
        .stages()
        .iter()
        .filter(|stage| ancestors.contains(stage.id.as_str()))
        .flat_map(|stage| {
            stage.fields().map(move |field| HeritableField {
                field_id: field.id.clone(),
                field_name: field.name.clone(),
                field_type: field.field_type,
                origin_stage_id: stage.id.clone(),
                origin_stage_label: stage.label.clone(),
            })
        })
        .collect()
}

/// Returns a copy of `graph` where `stage_id` gains an optional input that
/// inherits from `heritable`.
pub fn adopt(
    graph: &WorkflowGraph,
    stage_id: &str,
    heritable: &HeritableField,
    ids: &mut dyn IdGenerator,
) -> Result<WorkflowGraph, GraphError> {
    let mut stage = graph.stage(stage_id)?.clone();
    if !ancestors_of(graph, stage_id).contains(heritable.origin_stage_id.as_str()) {
        return Err(GraphError::NotAnAncestor {
            stage_id: stage_id.to_string(),
            origin_stage_id: heritable.origin_stage_id.clone(),
        });
    }
    let origin = graph.stage(&heritable.origin_stage_id)?;
    let source_field = origin.field_by_id(&heritable.field_id).ok_or_else(|| {
        GraphError::UnknownField {
            stage_id: origin.id.clone(),
            field_id: heritable.field_id.clone(),
        }
    })?;

    let mut id = ids.next_id();
    while stage.field_by_id(&id).is_some() {
        id = ids.next_id();
    }
    stage.inputs.push(
        Field::new(&id, &source_field.name, source_field.field_type)
            .with_source(&origin.id, &source_field.id),
    );
    graph.update_stage(stage)
}

/// Initial form state for a stage: typed values plus the names of inputs
/// filled from upstream snapshots.
///
/// `locked` is advisory for whoever renders the form; the engine accepts
/// whatever is submitted for those fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageForm {
    pub values: StageValues,
    pub locked: AHashSet<String>,
}

/// Prefills a stage's form from the snapshots of completed upstream stages.
///
/// An input with a `source`, alternatives included, takes the value the source
/// stage recorded under the source field's current name. Everything else starts
/// empty, booleans as `false`. A duplicated name follows its last declaration.
pub fn prefill(graph: &WorkflowGraph, stage: &Stage, snapshots: &Snapshots) -> StageForm {
    let mut form = StageForm::default();
    let inputs: AHashSet<&str> = stage
        .input_fields()
        .into_iter()
        .map(|field| field.id.as_str())
        .collect();

    for field in stage.resolved_fields() {
        let inherited = inputs
            .contains(field.id.as_str())
            .then(|| inherited_value(graph, field, snapshots))
            .flatten();
        match inherited {
            Some(value) => {
                form.values.insert(field.name.clone(), value.clone());
                form.locked.insert(field.name.clone());
            }
            None if field.field_type == FieldType::Boolean => {
                form.values.insert(field.name.clone(), Value::Bool(false));
            }
            None => {}
        }
    }

    form
}

fn inherited_value<'s>(
    graph: &WorkflowGraph,
    field: &Field,
    snapshots: &'s Snapshots,
) -> Option<&'s Value> {
    let source = field.source.as_ref()?;
    let snapshot = snapshots.get(&source.stage_id)?;
    let source_field = graph.stage(&source.stage_id).ok()?.field_by_id(&source.field_id)?;
    snapshot.get(&source_field.name)
}
