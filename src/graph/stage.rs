use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a stage field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        };
        write!(f, "{}", name)
    }
}

/// Marks a field as inherited at design time from a field of an upstream stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "nodeId", alias = "stageId", alias = "stage_id")]
    pub stage_id: String,
    #[serde(rename = "fieldId", alias = "field_id")]
    pub field_id: String,
}

/// A typed input or output slot on a stage.
///
/// `alternatives` forms an OR-group: the field counts as filled when it, or any
/// alternative at any depth, carries a value. Being an owned tree, the group
/// can never contain the field itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

impl Field {
    pub fn new(id: &str, name: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            field_type,
            required: false,
            alternatives: Vec::new(),
            source: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_alternative(mut self, alternative: Field) -> Self {
        self.alternatives.push(alternative);
        self
    }

    pub fn with_source(mut self, stage_id: &str, field_id: &str) -> Self {
        self.source = Some(SourceRef {
            stage_id: stage_id.to_string(),
            field_id: field_id.to_string(),
        });
        self
    }

    /// Visits this field and every alternative below it, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Field)) {
        visit(self);
        for alternative in &self.alternatives {
            alternative.walk(visit);
        }
    }

    /// Returns true if this field or any alternative (recursively) is populated.
    pub fn is_satisfied(&self, is_populated: &impl Fn(&Field) -> bool) -> bool {
        is_populated(self)
            || self
                .alternatives
                .iter()
                .any(|alternative| alternative.is_satisfied(is_populated))
    }
}

/// A unit of work with declared input and output fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub inputs: Vec<Field>,
    #[serde(default)]
    pub outputs: Vec<Field>,
}

impl Stage {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, field: Field) -> Self {
        self.inputs.push(field);
        self
    }

    pub fn with_output(mut self, field: Field) -> Self {
        self.outputs.push(field);
        self
    }

    /// Top-level inputs followed by top-level outputs, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Every declared field including alternatives, depth-first in declaration order.
    pub fn all_fields(&self) -> Vec<&Field> {
        flatten(self.fields())
    }

    /// Inputs including their alternatives, depth-first in declaration order.
    pub fn input_fields(&self) -> Vec<&Field> {
        flatten(self.inputs.iter())
    }

    /// One field per name, the last declaration of each name winning.
    ///
    /// Winners keep their relative declaration order.
    pub fn resolved_fields(&self) -> Vec<&Field> {
        let all = self.all_fields();
        let winners: AHashMap<&str, usize> = all
            .iter()
            .enumerate()
            .map(|(index, field)| (field.name.as_str(), index))
            .collect();
        all.iter()
            .enumerate()
            .filter(|(index, field)| winners.get(field.name.as_str()) == Some(index))
            .map(|(_, field)| *field)
            .collect()
    }

    pub fn field_by_id(&self, field_id: &str) -> Option<&Field> {
        self.all_fields().into_iter().find(|f| f.id == field_id)
    }

    /// Resolves a field by name. With duplicate names the last declaration wins.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.all_fields().into_iter().rev().find(|f| f.name == name)
    }
}

fn flatten<'a>(fields: impl Iterator<Item = &'a Field>) -> Vec<&'a Field> {
    let mut all = Vec::new();
    for field in fields {
        field.walk(&mut |f| all.push(f));
    }
    all
}
