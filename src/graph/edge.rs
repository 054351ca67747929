use crate::condition::Condition;
use crate::error::ConditionParseError;
use crate::value::StageValues;

/// The compiled form of an edge's textual guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// No guard was set; the edge always matches.
    Always,
    When(Condition),
    /// The guard failed to parse and the graph was loaded with
    /// `GuardPolicy::DisableEdge`. The edge never matches.
    Unusable {
        label: String,
        error: ConditionParseError,
    },
}

impl Guard {
    pub fn evaluate(&self, context: &StageValues) -> bool {
        match self {
            Guard::Always => true,
            Guard::When(condition) => condition.evaluate(context),
            Guard::Unusable { .. } => false,
        }
    }

    /// Evaluates the guard, returning the outcome and a readable reason.
    pub fn explain(&self, context: &StageValues) -> (bool, String) {
        match self {
            Guard::Always => (true, "unconditional".to_string()),
            Guard::When(condition) => {
                let trace = condition.explain(context);
                (trace.outcome, trace.to_string())
            }
            Guard::Unusable { label, error } => {
                (false, format!("unusable guard '{}': {}", label, error))
            }
        }
    }
}

/// A directed, optionally guarded transition between two stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// The guard text as written in the definition.
    pub label: Option<String>,
    pub guard: Guard,
}
