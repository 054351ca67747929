use super::{Condition, Literal, Operator};
use crate::value::{StageValues, Value};
use std::cmp::Ordering;
use std::fmt;

/// A record of how a guard was decided, kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardTrace {
    pub field: String,
    pub observed: Option<Value>,
    pub operator: Operator,
    pub literal: Literal,
    pub outcome: bool,
}

impl fmt::Display for GuardTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observed {
            Some(value) => write!(
                f,
                "{} (was {}) {} {}",
                self.field, value, self.operator, self.literal
            ),
            None => write!(f, "{} (unset) {} {}", self.field, self.operator, self.literal),
        }
    }
}

impl Condition {
    /// Evaluates the guard against a flat map of typed values.
    ///
    /// A missing key never satisfies a guard. Neither does a value whose kind
    /// does not match the literal.
    pub fn evaluate(&self, context: &StageValues) -> bool {
        match self {
            Condition::Comparison {
                field,
                operator,
                literal,
            } => context
                .get(field)
                .and_then(|value| compare(value, literal))
                .is_some_and(|ordering| operator.accepts(ordering)),
        }
    }

    /// Evaluates the guard and records the observed value alongside the outcome.
    pub fn explain(&self, context: &StageValues) -> GuardTrace {
        GuardTrace {
            field: self.field().to_string(),
            observed: context.get(self.field()).cloned(),
            operator: self.operator(),
            literal: self.literal().clone(),
            outcome: self.evaluate(context),
        }
    }
}

/// Orders an observed value against a literal of the same kind.
fn compare(value: &Value, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::Number(observed), Literal::Number(expected)) => observed.partial_cmp(expected),
        (Value::Text(observed), Literal::Text(expected)) => Some(observed.cmp(expected)),
        (Value::Bool(observed), Literal::Bool(expected)) => Some(observed.cmp(expected)),
        _ => None,
    }
}
