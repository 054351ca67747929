use super::WorkflowGraph;
use ahash::AHashSet;
use std::collections::VecDeque;

/// Collects every stage reachable by walking incoming edges backwards from `stage_id`.
///
/// The walk starts at the direct predecessors, so `stage_id` itself is only part of
/// the result when a cycle leads back to it. The visited set doubles as the result
/// and keeps the walk finite on cyclic graphs. Unknown ids have no ancestors.
pub fn ancestors_of<'g>(graph: &'g WorkflowGraph, stage_id: &str) -> AHashSet<&'g str> {
    let mut ancestors: AHashSet<&'g str> = AHashSet::new();
    let mut queue: VecDeque<&'g str> = graph
        .incoming_edges(stage_id)
        .map(|edge| edge.source.as_str())
        .collect();

    while let Some(current) = queue.pop_front() {
        if !ancestors.insert(current) {
            continue;
        }
        queue.extend(
            graph
                .incoming_edges(current)
                .map(|edge| edge.source.as_str())
                .filter(|source| !ancestors.contains(source)),
        );
    }

    ancestors
}
