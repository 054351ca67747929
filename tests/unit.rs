//! Unit tests for core Keiro types.
mod common;
use keiro::condition::allowed_operators;
use keiro::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

#[test]
fn test_value_display() {
    assert_eq!(format!("{}", Value::Number(42.0)), "42");
    assert_eq!(format!("{}", Value::Number(2.5)), "2.5");
    assert_eq!(format!("{}", Value::Bool(true)), "true");
    assert_eq!(format!("{}", Value::Text("ok".to_string())), "\"ok\"");
    assert_eq!(format!("{}", Value::Date("2024-01-31".to_string())), "\"2024-01-31\"");
}

#[test]
fn test_value_to_raw() {
    assert_eq!(Value::Number(3.0).to_raw(), serde_json::json!(3.0));
    assert_eq!(Value::Bool(false).to_raw(), serde_json::json!(false));
    assert_eq!(
        Value::Date("2024-01-31".to_string()).to_raw(),
        serde_json::json!("2024-01-31")
    );
}

#[test]
fn test_value_hash_distinguishes_kinds() {
    let mut set = HashSet::new();
    set.insert(Value::Text("1".to_string()));
    set.insert(Value::Date("1".to_string()));
    set.insert(Value::Number(1.0));
    set.insert(Value::Number(1.0));
    assert_eq!(set.len(), 3);
}

#[test]
fn test_operator_symbols() {
    assert_eq!(Operator::from_symbol("=="), Some(Operator::Equal));
    assert_eq!(Operator::from_symbol("==="), Some(Operator::Equal));
    assert_eq!(Operator::from_symbol("!=="), Some(Operator::NotEqual));
    assert_eq!(Operator::from_symbol("<="), Some(Operator::SmallerThanOrEqual));
    assert_eq!(Operator::from_symbol("=>"), None);
    assert_eq!(Operator::NotEqual.symbol(), "!=");
    assert_eq!(Operator::GreaterThanOrEqual.to_string(), ">=");
}

#[test]
fn test_operator_accepts_ordering() {
    assert!(Operator::Equal.accepts(Ordering::Equal));
    assert!(!Operator::Equal.accepts(Ordering::Less));
    assert!(Operator::NotEqual.accepts(Ordering::Greater));
    assert!(Operator::GreaterThan.accepts(Ordering::Greater));
    assert!(!Operator::GreaterThan.accepts(Ordering::Equal));
    assert!(Operator::SmallerThanOrEqual.accepts(Ordering::Equal));
    assert!(Operator::SmallerThan.accepts(Ordering::Less));
    assert!(!Operator::GreaterThanOrEqual.accepts(Ordering::Less));
}

#[test]
fn test_allowed_operators_table() {
    assert_eq!(
        allowed_operators(FieldType::String),
        &[Operator::Equal, Operator::NotEqual]
    );
    assert_eq!(allowed_operators(FieldType::Boolean), allowed_operators(FieldType::String));
    assert_eq!(allowed_operators(FieldType::Number).len(), 6);
    assert!(allowed_operators(FieldType::Date).is_empty());
}

#[test]
fn test_literal_display() {
    assert_eq!(Literal::Text("it's".to_string()).to_string(), r"'it\'s'");
    assert_eq!(Literal::Number(-3.0).to_string(), "-3");
    assert_eq!(Literal::Number(0.5).to_string(), "0.5");
    assert_eq!(Literal::Bool(false).to_string(), "false");
}

#[test]
fn test_field_satisfaction_is_recursive() {
    let field = Field::new("a", "a", FieldType::String)
        .required()
        .with_alternative(
            Field::new("b", "b", FieldType::String)
                .with_alternative(Field::new("c", "c", FieldType::String)),
        );

    assert!(field.is_satisfied(&|f: &Field| f.id == "c"));
    assert!(field.is_satisfied(&|f: &Field| f.id == "a"));
    assert!(!field.is_satisfied(&|_: &Field| false));
}

#[test]
fn test_stage_field_lookup() {
    let stage = Stage::new("S", "Stage")
        .with_input(Field::new("i1", "amount", FieldType::Number))
        .with_output(
            Field::new("o1", "email", FieldType::String)
                .with_alternative(Field::new("o2", "phone", FieldType::String)),
        )
        .with_output(Field::new("o3", "amount", FieldType::String));

    let ids: Vec<&str> = stage.all_fields().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["i1", "o1", "o2", "o3"]);
    assert_eq!(stage.fields().count(), 3);
    let resolved: Vec<&str> = stage.resolved_fields().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(resolved, vec!["o1", "o2", "o3"]);
    let inputs: Vec<&str> = stage.input_fields().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(inputs, vec!["i1"]);
    assert_eq!(stage.field_by_id("o2").unwrap().name, "phone");
    assert_eq!(stage.field_by_name("amount").unwrap().id, "o3");
    assert!(stage.field_by_name("fax").is_none());
}

#[test]
fn test_sequential_ids() {
    let mut ids = SequentialIds::new("stage-", 7);
    assert_eq!(ids.next_id(), "stage-7");
    assert_eq!(ids.next_id(), "stage-8");

    let mut defaults = SequentialIds::default();
    assert_eq!(defaults.next_id(), "node_1");
}

#[test]
fn test_random_ids_are_unique() {
    let mut ids = RandomIds;
    let generated: HashSet<String> = (0..100).map(|_| ids.next_id()).collect();
    assert_eq!(generated.len(), 100);
}

#[test]
fn test_status_display() {
    assert_eq!(ExecutionStatus::NotStarted.to_string(), "not started");
    assert_eq!(
        ExecutionStatus::Stalled(StallReason::NoMatchingTransition).to_string(),
        "stalled (no matching transition)"
    );
    assert_eq!(ExecutionStatus::default(), ExecutionStatus::NotStarted);
}

#[test]
fn test_error_display() {
    let err = GraphError::InvalidReference {
        edge_id: "e1".to_string(),
        stage_id: "ghost".to_string(),
    };
    assert!(err.to_string().contains("e1"));
    assert!(err.to_string().contains("ghost"));

    let err = GraphError::Condition {
        edge_id: "e2".to_string(),
        source: ConditionParseError::OperatorNotAllowed {
            field: "status".to_string(),
            field_type: FieldType::String,
            operator: Operator::GreaterThan,
        },
    };
    assert!(err.to_string().contains("e2"));
    assert!(err.to_string().contains("'>'"));
    assert!(err.to_string().contains("string"));

    let err = ExecutionError::Validation {
        field: "count".to_string(),
        issue: ValidationIssue::InvalidNumber("abc".to_string()),
    };
    assert!(err.to_string().contains("count"));
    assert!(err.to_string().contains("'abc' is not a number"));

    let err = ExecutionError::AmbiguousEntryPoint {
        candidates: vec!["x".to_string(), "y".to_string()],
    };
    assert!(err.to_string().contains("[x, y]"));

    let err = ExecutionError::NotRunning {
        status: ExecutionStatus::Completed,
    };
    assert!(err.to_string().contains("completed"));
}

#[test]
fn test_field_serde_shape() {
    let field: Field = serde_json::from_value(serde_json::json!({
        "id": "f1",
        "name": "amount",
        "type": "number",
        "source": { "nodeId": "s1", "fieldId": "o1" }
    }))
    .unwrap();

    assert_eq!(field.field_type, FieldType::Number);
    assert!(!field.required);
    assert!(field.alternatives.is_empty());
    assert_eq!(field.source.as_ref().unwrap().stage_id, "s1");

    let json = serde_json::to_value(&field).unwrap();
    assert_eq!(json["type"], "number");
    assert_eq!(json["source"]["nodeId"], "s1");
    assert!(json.get("alternatives").is_none());
}
