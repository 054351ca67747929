//! The guard language attached to edges.
//!
//! A guard is a single comparison `field operator literal`. There is no boolean
//! composition and no expression evaluation beyond the comparison itself. Guards
//! are parsed once, against the fields of the edge's source stage, so that every
//! literal and operator is known to fit the field's declared type before any
//! execution starts.

use crate::graph::FieldType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

mod evaluator;
pub mod parser;

pub use evaluator::GuardTrace;

/// Defines the `Operator` enum together with its canonical symbol and the
/// legacy spellings accepted by the parser.
macro_rules! define_operators {
    ( $( ($variant:ident, $symbol:literal $(, $alias:literal)* ) ),* $(,)? ) => {
        /// A comparison operator usable in a guard.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Operator {
            $( $variant, )*
        }

        impl Operator {
            /// The canonical spelling of the operator.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $( Operator::$variant => $symbol, )*
                }
            }

            /// Looks up an operator by its canonical or legacy spelling.
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match symbol {
                    $( $symbol $( | $alias )* => Some(Operator::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

define_operators! {
    (Equal, "==", "==="),
    (NotEqual, "!=", "!=="),
    (GreaterThan, ">"),
    (SmallerThan, "<"),
    (GreaterThanOrEqual, ">="),
    (SmallerThanOrEqual, "<="),
}

impl Operator {
    /// Decides the comparison given how the observed value orders against the literal.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering.is_eq(),
            Operator::NotEqual => ordering.is_ne(),
            Operator::GreaterThan => ordering.is_gt(),
            Operator::SmallerThan => ordering.is_lt(),
            Operator::GreaterThanOrEqual => ordering.is_ge(),
            Operator::SmallerThanOrEqual => ordering.is_le(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

const EQUALITY_OPERATORS: &[Operator] = &[Operator::Equal, Operator::NotEqual];

const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterThan,
    Operator::SmallerThan,
    Operator::GreaterThanOrEqual,
    Operator::SmallerThanOrEqual,
];

/// The operators a guard may apply to a field of the given type.
pub fn allowed_operators(field_type: FieldType) -> &'static [Operator] {
    match field_type {
        FieldType::String | FieldType::Boolean => EQUALITY_OPERATORS,
        FieldType::Number => ORDERED_OPERATORS,
        FieldType::Date => &[],
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "'{}'", escape(s)),
            Literal::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A parsed, type-checked guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Comparison {
        field: String,
        operator: Operator,
        literal: Literal,
    },
}

impl Condition {
    /// Builds a comparison directly, the way a condition editor would.
    ///
    /// No type check happens here; render it with `to_string()` and attach it to
    /// an edge through `WorkflowGraph::set_guard` to have it checked.
    pub fn new(field: &str, operator: Operator, literal: Literal) -> Self {
        Condition::Comparison {
            field: field.to_string(),
            operator,
            literal,
        }
    }

    /// The context key the guard reads.
    pub fn field(&self) -> &str {
        match self {
            Condition::Comparison { field, .. } => field,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Comparison { operator, .. } => *operator,
        }
    }

    pub fn literal(&self) -> &Literal {
        match self {
            Condition::Comparison { literal, .. } => literal,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison {
                field,
                operator,
                literal,
            } => {
                if is_bare_identifier(field) {
                    write!(f, "{} {} {}", field, operator, literal)
                } else {
                    write!(f, "ctx['{}'] {} {}", escape(field), operator, literal)
                }
            }
        }
    }
}

pub(crate) fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "ctx" && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
