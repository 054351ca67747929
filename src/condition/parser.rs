use super::{Condition, Literal, Operator, allowed_operators};
use crate::error::ConditionParseError;
use crate::graph::{FieldType, Stage};

/// The right-hand side as written, before it is checked against a field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralToken {
    Quoted(String),
    Bare(String),
}

/// A syntactically valid guard that has not yet been checked against a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCondition {
    pub field: String,
    pub operator: Operator,
    pub literal: LiteralToken,
}

/// Operator spellings, longest first so `===` wins over `==`.
const OPERATOR_SPELLINGS: &[&str] = &["===", "!==", "==", "!=", ">=", "<=", ">", "<"];

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ConditionParseError {
        ConditionParseError::Syntax {
            input: self.input.to_string(),
            message: message.into(),
        }
    }

    /// `ctx['name']`, `ctx["name"]` or a bare name.
    fn field_ref(&mut self) -> Result<String, ConditionParseError> {
        let start = self.pos;
        if self.eat("ctx") {
            self.skip_whitespace();
            if self.eat("[") {
                self.skip_whitespace();
                let name = self.quoted()?;
                self.skip_whitespace();
                if !self.eat("]") {
                    return Err(self.error("expected ']' after field name"));
                }
                return Ok(name);
            }
            self.pos = start;
        }

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '-') {
                self.bump();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(format!("expected a field name at offset {}", start)));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn operator(&mut self) -> Result<Operator, ConditionParseError> {
        for spelling in OPERATOR_SPELLINGS {
            if self.eat(spelling) {
                // Every entry in OPERATOR_SPELLINGS is known to `from_symbol`.
                return Operator::from_symbol(spelling)
                    .ok_or_else(|| self.error(format!("unknown operator '{}'", spelling)));
            }
        }
        Err(self.error(format!("expected a comparison operator at offset {}", self.pos)))
    }

    /// A single- or double-quoted string with backslash escapes.
    fn quoted(&mut self) -> Result<String, ConditionParseError> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(c) if c == quote => return Ok(text),
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    fn literal(&mut self) -> Result<LiteralToken, ConditionParseError> {
        match self.peek() {
            Some('\'' | '"') => self.quoted().map(LiteralToken::Quoted),
            Some(_) => {
                let start = self.pos;
                while self.peek().is_some_and(|c| !c.is_whitespace()) {
                    self.bump();
                }
                Ok(LiteralToken::Bare(self.input[start..self.pos].to_string()))
            }
            None => Err(self.error("expected a literal after the operator")),
        }
    }
}

/// Parses the surface syntax of a guard without looking at field types.
pub fn parse(input: &str) -> Result<ParsedCondition, ConditionParseError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    let field = cursor.field_ref()?;
    cursor.skip_whitespace();
    let operator = cursor.operator()?;
    cursor.skip_whitespace();
    let literal = cursor.literal()?;
    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(cursor.error(format!("unexpected trailing input '{}'", cursor.rest())));
    }
    Ok(ParsedCondition {
        field,
        operator,
        literal,
    })
}

impl Condition {
    /// Parses a guard and checks it against the fields declared on `stage`,
    /// which is the source stage of the edge carrying the guard.
    pub fn compile(input: &str, stage: &Stage) -> Result<Condition, ConditionParseError> {
        let parsed = parse(input)?;
        let field = stage
            .field_by_name(&parsed.field)
            .ok_or_else(|| ConditionParseError::UnknownField(parsed.field.clone()))?;

        let allowed = allowed_operators(field.field_type);
        if allowed.is_empty() {
            return Err(ConditionParseError::UnsupportedType {
                field: field.name.clone(),
                field_type: field.field_type,
            });
        }
        if !allowed.contains(&parsed.operator) {
            return Err(ConditionParseError::OperatorNotAllowed {
                field: field.name.clone(),
                field_type: field.field_type,
                operator: parsed.operator,
            });
        }

        let literal = typed_literal(&parsed.literal, field.field_type).ok_or_else(|| {
            ConditionParseError::LiteralTypeMismatch {
                field: field.name.clone(),
                expected: field.field_type,
            }
        })?;

        Ok(Condition::Comparison {
            field: parsed.field,
            operator: parsed.operator,
            literal,
        })
    }
}

fn typed_literal(token: &LiteralToken, field_type: FieldType) -> Option<Literal> {
    match (field_type, token) {
        (FieldType::String, LiteralToken::Quoted(text)) => Some(Literal::Text(text.clone())),
        (FieldType::Number, LiteralToken::Bare(text)) => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Literal::Number),
        (FieldType::Boolean, LiteralToken::Bare(text)) => match text.as_str() {
            "true" => Some(Literal::Bool(true)),
            "false" => Some(Literal::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
