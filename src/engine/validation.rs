use crate::error::{ExecutionError, ValidationIssue};
use crate::graph::{FieldType, Stage};
use crate::value::{RawValues, StageValues, Value};

/// Coerces and checks a submission for `stage`.
///
/// Each field name is coerced once, against its last declaration; any failure
/// aborts the whole submission. Required fields are checked afterwards, an
/// OR-group being filled when any of its members holds a value. Keys that name
/// no declared field are ignored.
pub(super) fn validate_submission(
    stage: &Stage,
    raw: &RawValues,
) -> Result<StageValues, ExecutionError> {
    let mut values = StageValues::new();

    for field in stage.resolved_fields() {
        let Some(raw_value) = raw.get(&field.name) else {
            continue;
        };
        let coerced = coerce(field.field_type, raw_value).map_err(|issue| {
            ExecutionError::Validation {
                field: field.name.clone(),
                issue,
            }
        })?;
        if let Some(value) = coerced {
            values.insert(field.name.clone(), value);
        }
    }

    for field in stage.fields().filter(|field| field.required) {
        if !field.is_satisfied(&|member| values.contains_key(&member.name)) {
            return Err(ExecutionError::Validation {
                field: field.name.clone(),
                issue: ValidationIssue::Missing,
            });
        }
    }

    Ok(values)
}

/// Converts one raw value to the field's type. `Ok(None)` means "left empty".
fn coerce(
    field_type: FieldType,
    raw: &serde_json::Value,
) -> Result<Option<Value>, ValidationIssue> {
    use serde_json::Value as Raw;

    match (field_type, raw) {
        (_, Raw::Null) => Ok(None),
        (_, Raw::Array(_) | Raw::Object(_)) => {
            Err(ValidationIssue::UnsupportedValue(raw.to_string()))
        }

        (FieldType::Boolean, Raw::Bool(b)) => Ok(Some(Value::Bool(*b))),
        (FieldType::Boolean, Raw::String(s)) => match s.trim() {
            "" => Ok(None),
            "true" => Ok(Some(Value::Bool(true))),
            "false" => Ok(Some(Value::Bool(false))),
            _ => Err(ValidationIssue::InvalidBoolean(s.clone())),
        },
        (FieldType::Boolean, Raw::Number(n)) => {
            Err(ValidationIssue::InvalidBoolean(n.to_string()))
        }

        (FieldType::Number, Raw::Number(n)) => n
            .as_f64()
            .map(|n| Some(Value::Number(n)))
            .ok_or_else(|| ValidationIssue::InvalidNumber(n.to_string())),
        (FieldType::Number, Raw::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| Some(Value::Number(n)))
                .ok_or_else(|| ValidationIssue::InvalidNumber(s.clone()))
        }
        (FieldType::Number, Raw::Bool(b)) => Err(ValidationIssue::InvalidNumber(b.to_string())),

        (FieldType::String | FieldType::Date, raw) => {
            let text = match raw {
                Raw::String(s) => s.clone(),
                other => other.to_string(),
            };
            if text.is_empty() {
                Ok(None)
            } else if field_type == FieldType::Date {
                Ok(Some(Value::Date(text)))
            } else {
                Ok(Some(Value::Text(text)))
            }
        }
    }
}
