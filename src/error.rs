use crate::condition::Operator;
use crate::engine::ExecutionStatus;
use crate::graph::FieldType;
use thiserror::Error;

/// Errors that can occur while building or editing a `WorkflowGraph`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Failed to parse workflow JSON: {0}")]
    Json(String),

    #[error("Edge '{edge_id}' references stage '{stage_id}', which does not exist in the workflow")]
    InvalidReference { edge_id: String, stage_id: String },

    #[error("Stage '{stage_id}' declares the field id '{field_id}' more than once")]
    DuplicateFieldId { stage_id: String, field_id: String },

    #[error("Stage id '{0}' is declared more than once")]
    DuplicateStageId(String),

    #[error("Stage '{0}' not found")]
    UnknownStage(String),

    #[error("Edge '{0}' not found")]
    UnknownEdge(String),

    #[error("Field '{field_id}' not found on stage '{stage_id}'")]
    UnknownField { stage_id: String, field_id: String },

    #[error("Stage '{origin_stage_id}' is not upstream of stage '{stage_id}'")]
    NotAnAncestor {
        stage_id: String,
        origin_stage_id: String,
    },

    #[error("Guard on edge '{edge_id}' is invalid: {source}")]
    Condition {
        edge_id: String,
        source: ConditionParseError,
    },
}

/// Errors raised while parsing a guard against the fields of its source stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionParseError {
    #[error("Syntax error in condition '{input}': {message}")]
    Syntax { input: String, message: String },

    #[error("Condition references '{0}', which is not a field of the source stage")]
    UnknownField(String),

    #[error("Literal for field '{field}' must be a {expected} literal")]
    LiteralTypeMismatch { field: String, expected: FieldType },

    #[error("Operator '{operator}' is not allowed for {field_type} field '{field}'")]
    OperatorNotAllowed {
        field: String,
        field_type: FieldType,
        operator: Operator,
    },

    #[error("Field '{field}' has type {field_type}, which cannot be used in a condition")]
    UnsupportedType { field: String, field_type: FieldType },
}

/// The specific reason a submitted field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required field (and every alternative in its group) was left empty.
    Missing,
    InvalidNumber(String),
    InvalidBoolean(String),
    /// The raw value has a shape no field type accepts (arrays, objects).
    UnsupportedValue(String),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::Missing => write!(f, "a value is required"),
            ValidationIssue::InvalidNumber(raw) => write!(f, "'{}' is not a number", raw),
            ValidationIssue::InvalidBoolean(raw) => write!(f, "'{}' is not a boolean", raw),
            ValidationIssue::UnsupportedValue(raw) => write!(f, "unsupported value {}", raw),
        }
    }
}

/// Errors that can occur while driving an `ExecutionEngine`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Validation failed for field '{field}': {issue}")]
    Validation {
        field: String,
        issue: ValidationIssue,
    },

    #[error(
        "Cannot pick an entry stage automatically, candidates without incoming edges: [{}]",
        candidates.join(", ")
    )]
    AmbiguousEntryPoint { candidates: Vec<String> },

    #[error("Stage '{0}' not found in the workflow")]
    UnknownStage(String),

    #[error("No stage is active (execution status: {status})")]
    NotRunning { status: ExecutionStatus },
}

/// Errors produced by the snapshot persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Snapshot serialization failed: {0}")]
    Encode(String),

    #[error("Snapshot deserialization failed: {0}")]
    Decode(String),
}
