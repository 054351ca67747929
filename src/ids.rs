//! Id generation for design-time edits.
//!
//! The caller owns the generator and passes it to editing operations, so no
//! process-wide counter exists.

use uuid::Uuid;

pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// A monotonic counter producing `{prefix}{n}`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: &str, start: u64) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: start,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("node_", 1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}
