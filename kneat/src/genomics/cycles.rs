use super::ConnectionGenes;
use crate::Innovation;

use ahash::RandomState;

use std::collections::{HashMap, HashSet};

/// Returns `true` if adding a connection from `source` to
/// `target` would close a cycle in `connections`.
///
/// Performs a depth-first search from `target` along existing
/// connections (enabled or not), looking for `source`.
/// A self-connection always counts as a cycle.
///
/// # Examples
/// ```
/// use kneat::genomics::{would_create_cycle, ConnectionGene, ConnectionGenes};
///
/// let connections: ConnectionGenes = vec![
///     ConnectionGene::new(10, 0, 5, 1.0),
///     ConnectionGene::new(11, 5, 6, 1.0),
///     ConnectionGene::new(12, 6, 3, 1.0),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!(would_create_cycle(&connections, 6, 5));
/// assert!(would_create_cycle(&connections, 3, 0));
/// assert!(!would_create_cycle(&connections, 0, 6));
/// ```
pub fn would_create_cycle(connections: &ConnectionGenes, source: Innovation, target: Innovation) -> bool {
    if source == target {
        return true;
    }

    let mut visited = HashSet::with_hasher(RandomState::new());
    let mut stack = vec![target];
    visited.insert(target);

    while let Some(node) = stack.pop() {
        for gene in connections.outgoing(node) {
            let next = gene.target();
            if next == source {
                return true;
            }
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }

    false
}

/// Returns `true` if `connections` contains at least one cycle.
pub fn is_cyclic(connections: &ConnectionGenes) -> bool {
    const UNVISITED: u8 = 0;
    const ON_STACK: u8 = 1;
    const DONE: u8 = 2;

    let mut state = HashMap::with_hasher(RandomState::new());

    for root in connections.iter().map(|g| g.source()) {
        if state.get(&root).copied().unwrap_or(UNVISITED) != UNVISITED {
            continue;
        }
        // (node, index of the next outgoing connection to follow)
        let mut stack: Vec<(Innovation, usize)> = vec![(root, 0)];
        state.insert(root, ON_STACK);

        while let Some((node, next_edge)) = stack.last_mut() {
            let outgoing = connections.outgoing(*node);
            if let Some(gene) = outgoing.get(*next_edge) {
                *next_edge += 1;
                let target = gene.target();
                match state.get(&target).copied().unwrap_or(UNVISITED) {
                    ON_STACK => return true,
                    UNVISITED => {
                        state.insert(target, ON_STACK);
                        stack.push((target, 0));
                    }
                    _ => {}
                }
            } else {
                state.insert(*node, DONE);
                stack.pop();
            }
        }
    }

    false
}
