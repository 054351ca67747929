//! The immutable stage graph.
//!
//! A `WorkflowGraph` is built once from a `WorkflowDefinition` and never changes
//! afterwards. Stages live in an arena in declaration order and are addressed by
//! id through an index map; edges keep their declaration order, which is the
//! tie-break order for transition selection. Editing operations return a new
//! graph and leave the original untouched.

use crate::condition::Condition;
use crate::error::{ConditionParseError, GraphError};
use crate::ids::IdGenerator;
use crate::model::{EdgeDefinition, WorkflowDefinition};
use ahash::{AHashMap, AHashSet};
use tracing::warn;

pub mod ancestors;
mod edge;
pub mod inheritance;
mod stage;

pub use ancestors::ancestors_of;
pub use edge::{Edge, Guard};
pub use inheritance::{HeritableField, StageForm};
pub use stage::{Field, FieldType, SourceRef, Stage};

/// What to do with a guard that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Reject the whole graph with `GraphError::Condition`.
    #[default]
    Reject,
    /// Load the graph and mark the edge as `Guard::Unusable`.
    DisableEdge,
}

#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    stages: Vec<Stage>,
    stage_index: AHashMap<String, usize>,
    edges: Vec<Edge>,
    outgoing: AHashMap<String, Vec<usize>>,
    incoming: AHashMap<String, Vec<usize>>,
    guard_policy: GuardPolicy,
}

pub struct GraphBuilder {
    definition: WorkflowDefinition,
    guard_policy: GuardPolicy,
}

impl GraphBuilder {
    pub fn new(definition: WorkflowDefinition) -> Self {
        Self {
            definition,
            guard_policy: GuardPolicy::default(),
        }
    }

    pub fn guard_policy(mut self, policy: GuardPolicy) -> Self {
        self.guard_policy = policy;
        self
    }

    /// Validates the definition and compiles every guard.
    pub fn build(self) -> Result<WorkflowGraph, GraphError> {
        let GraphBuilder {
            definition: WorkflowDefinition { stages, edges },
            guard_policy,
        } = self;

        let mut stage_index = AHashMap::with_capacity(stages.len());
        for (idx, stage) in stages.iter().enumerate() {
            if stage_index.insert(stage.id.clone(), idx).is_some() {
                return Err(GraphError::DuplicateStageId(stage.id.clone()));
            }
            check_fields(stage)?;
        }

        let mut compiled = Vec::with_capacity(edges.len());
        let mut outgoing: AHashMap<String, Vec<usize>> = AHashMap::new();
        let mut incoming: AHashMap<String, Vec<usize>> = AHashMap::new();

        for (idx, definition) in edges.into_iter().enumerate() {
            let source_stage = stage_index
                .get(&definition.source)
                .map(|&i| &stages[i])
                .ok_or_else(|| GraphError::InvalidReference {
                    edge_id: definition.id.clone(),
                    stage_id: definition.source.clone(),
                })?;
            if !stage_index.contains_key(&definition.target) {
                return Err(GraphError::InvalidReference {
                    edge_id: definition.id.clone(),
                    stage_id: definition.target.clone(),
                });
            }

            let guard = compile_guard(&definition, source_stage, guard_policy)?;
            outgoing
                .entry(definition.source.clone())
                .or_default()
                .push(idx);
            incoming
                .entry(definition.target.clone())
                .or_default()
                .push(idx);
            compiled.push(Edge {
                id: definition.id,
                source: definition.source,
                target: definition.target,
                label: definition.label,
                guard,
            });
        }

        Ok(WorkflowGraph {
            stages,
            stage_index,
            edges: compiled,
            outgoing,
            incoming,
            guard_policy,
        })
    }
}

fn compile_guard(
    definition: &EdgeDefinition,
    source_stage: &Stage,
    policy: GuardPolicy,
) -> Result<Guard, GraphError> {
    let label = match definition.label.as_deref().map(str::trim) {
        None | Some("") => return Ok(Guard::Always),
        Some(label) => label,
    };
    match Condition::compile(label, source_stage) {
        Ok(condition) => Ok(Guard::When(condition)),
        Err(error) => handle_guard_error(&definition.id, label, error, policy),
    }
}

fn handle_guard_error(
    edge_id: &str,
    label: &str,
    error: ConditionParseError,
    policy: GuardPolicy,
) -> Result<Guard, GraphError> {
    match policy {
        GuardPolicy::Reject => Err(GraphError::Condition {
            edge_id: edge_id.to_string(),
            source: error,
        }),
        GuardPolicy::DisableEdge => {
            warn!(edge = edge_id, %error, "guard is unusable, edge disabled");
            Ok(Guard::Unusable {
                label: label.to_string(),
                error,
            })
        }
    }
}

/// Field ids must be unique within a stage, alternatives included.
fn check_fields(stage: &Stage) -> Result<(), GraphError> {
    let mut ids = AHashSet::new();
    let mut names = AHashSet::new();
    for field in stage.all_fields() {
        if !ids.insert(field.id.as_str()) {
            return Err(GraphError::DuplicateFieldId {
                stage_id: stage.id.clone(),
                field_id: field.id.clone(),
            });
        }
        if !names.insert(field.name.as_str()) {
            warn!(
                stage = %stage.id,
                field = %field.name,
                "duplicate field name, the last declaration wins"
            );
        }
    }
    Ok(())
}

impl WorkflowGraph {
    pub fn builder(definition: WorkflowDefinition) -> GraphBuilder {
        GraphBuilder::new(definition)
    }

    /// Builds a graph with the default `GuardPolicy::Reject`.
    pub fn from_definition(definition: WorkflowDefinition) -> Result<Self, GraphError> {
        GraphBuilder::new(definition).build()
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_definition(WorkflowDefinition::from_json(json)?)
    }

    pub fn guard_policy(&self) -> GuardPolicy {
        self.guard_policy
    }

    pub fn stage(&self, id: &str) -> Result<&Stage, GraphError> {
        self.stage_index
            .get(id)
            .map(|&idx| &self.stages[idx])
            .ok_or_else(|| GraphError::UnknownStage(id.to_string()))
    }

    pub fn contains_stage(&self, id: &str) -> bool {
        self.stage_index.contains_key(id)
    }

    /// Stages in declaration order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Edges leaving `stage_id`, in graph declaration order.
    pub fn outgoing_edges<'a>(
        &'a self,
        stage_id: &str,
    ) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.edges_at(&self.outgoing, stage_id)
    }

    /// Edges entering `stage_id`, in graph declaration order.
    pub fn incoming_edges<'a>(
        &'a self,
        stage_id: &str,
    ) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.edges_at(&self.incoming, stage_id)
    }

    fn edges_at<'a>(
        &'a self,
        index: &'a AHashMap<String, Vec<usize>>,
        stage_id: &str,
    ) -> impl Iterator<Item = &'a Edge> + use<'a> {
        index
            .get(stage_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Stages without incoming edges, in declaration order.
    pub fn entry_candidates(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|stage| !self.incoming.contains_key(&stage.id))
            .map(|stage| stage.id.as_str())
            .collect()
    }

    /// Every stage upstream of `stage_id`. See [`ancestors_of`].
    pub fn ancestors_of(&self, stage_id: &str) -> AHashSet<&str> {
        ancestors_of(self, stage_id)
    }

    /// Reconstructs the definition this graph was built from, guards as text.
    pub fn to_definition(&self) -> WorkflowDefinition {
        WorkflowDefinition {
            stages: self.stages.clone(),
            edges: self
                .edges
                .iter()
                .map(|edge| EdgeDefinition {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    label: edge.label.clone(),
                })
                .collect(),
        }
    }

    fn rebuild(&self, definition: WorkflowDefinition) -> Result<Self, GraphError> {
        GraphBuilder::new(definition)
            .guard_policy(self.guard_policy)
            .build()
    }

    /// Returns a copy of the graph with the guard on `edge_id` replaced.
    /// `None` or an empty label makes the edge unconditional.
    pub fn set_guard(&self, edge_id: &str, label: Option<&str>) -> Result<Self, GraphError> {
        let mut definition = self.to_definition();
        let edge = definition
            .edges
            .iter_mut()
            .find(|edge| edge.id == edge_id)
            .ok_or_else(|| GraphError::UnknownEdge(edge_id.to_string()))?;
        edge.label = label.map(str::to_string);
        self.rebuild(definition)
    }

    /// Returns a copy of the graph with a new, empty stage appended.
    /// The id comes from `ids`; ids already taken in this graph are skipped.
    pub fn add_stage(
        &self,
        label: &str,
        ids: &mut dyn IdGenerator,
    ) -> Result<(Self, String), GraphError> {
        let mut id = ids.next_id();
        while self.contains_stage(&id) {
            id = ids.next_id();
        }
        let mut definition = self.to_definition();
        definition.stages.push(Stage::new(&id, label));
        Ok((self.rebuild(definition)?, id))
    }

    /// Returns a copy of the graph with a new edge appended after all existing ones.
    pub fn add_edge(&self, edge: EdgeDefinition) -> Result<Self, GraphError> {
        let mut definition = self.to_definition();
        definition.edges.push(edge);
        self.rebuild(definition)
    }

    /// Returns a copy of the graph with the stage's label and fields replaced.
    pub fn update_stage(&self, stage: Stage) -> Result<Self, GraphError> {
        let mut definition = self.to_definition();
        let slot = definition
            .stages
            .iter_mut()
            .find(|existing| existing.id == stage.id)
            .ok_or_else(|| GraphError::UnknownStage(stage.id.clone()))?;
        *slot = stage;
        self.rebuild(definition)
    }
}
