use super::DirectedGraph;
use crate::errors::NetworkError;
use kneat::Innovation;

use std::collections::VecDeque;

/// A contiguous run of nodes sharing a depth, and
/// the end of the run of connections leaving them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layer {
    /// One past the last node index in the layer.
    pub end_node: usize,
    /// One past the last connection whose
    /// source lies in the layer.
    pub end_connection: usize,
}

/// A directed acyclic graph with nodes ordered by depth,
/// so that it can be activated in a single pass.
///
/// The depth of a node is the length of the longest path
/// reaching it from a node without incoming connections.
/// Inputs keep the first indices; output positions are
/// given by [`output_node_indices`](AcyclicGraph::output_node_indices).
#[derive(Clone, Debug, PartialEq)]
pub struct AcyclicGraph {
    graph: DirectedGraph,
    depths: Vec<usize>,
    layers: Vec<Layer>,
    output_node_indices: Vec<usize>,
}

impl AcyclicGraph {
    /// Computes node depths and reorders the graph into layers.
    ///
    /// # Errors
    /// Returns [`NetworkError::CyclicGraph`] if the graph has a cycle.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::graphs::{AcyclicGraph, DirectedGraph};
    ///
    /// let graph = DirectedGraph::from_connections(
    ///     &[0, 1],
    ///     &[3],
    ///     &[(0, 2, 0.5), (1, 2, 0.3), (2, 3, 0.8)],
    /// );
    /// let graph = AcyclicGraph::new(graph).unwrap();
    ///
    /// assert_eq!(graph.depth_of(0), Some(0));
    /// assert_eq!(graph.depth_of(1), Some(0));
    /// assert_eq!(graph.depth_of(2), Some(1));
    /// assert_eq!(graph.depth_of(3), Some(2));
    /// assert_eq!(graph.layers().len(), 3);
    /// ```
    pub fn new(graph: DirectedGraph) -> Result<AcyclicGraph, NetworkError> {
        let depths = longest_path_depths(&graph).ok_or(NetworkError::CyclicGraph)?;

        // Stable ordering by depth; inputs all have
        // depth 0 and so keep their leading indices.
        let mut order: Vec<usize> = (0..graph.node_count()).collect();
        order.sort_by_key(|&i| depths[i]);
        let mut new_index = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            new_index[old] = new;
        }

        let node_ids: Vec<Innovation> = order.iter().map(|&old| graph.node_ids[old]).collect();
        let sorted_depths: Vec<usize> = order.iter().map(|&old| depths[old]).collect();

        let mut indexed: Vec<((usize, usize), f64)> = graph
            .connections
            .iter()
            .zip(&graph.weights)
            .map(|(&(s, t), &w)| ((new_index[s], new_index[t]), w))
            .collect();
        indexed.sort_unstable_by_key(|(endpoints, _)| *endpoints);
        let (connections, weights): (Vec<_>, Vec<_>) = indexed.into_iter().unzip();

        let layer_count = sorted_depths.last().map_or(0, |d| d + 1);
        let mut layers = Vec::with_capacity(layer_count);
        let (mut end_node, mut end_connection) = (0, 0);
        for depth in 0..layer_count {
            while end_node < sorted_depths.len() && sorted_depths[end_node] == depth {
                end_node += 1;
            }
            while end_connection < connections.len() && connections[end_connection].0 < end_node {
                end_connection += 1;
            }
            layers.push(Layer {
                end_node,
                end_connection,
            });
        }

        let output_node_indices = (graph.input_count..graph.input_count + graph.output_count)
            .map(|old| new_index[old])
            .collect();

        Ok(AcyclicGraph {
            graph: DirectedGraph {
                node_ids,
                connections,
                weights,
                ..graph
            },
            depths: sorted_depths,
            layers,
            output_node_indices,
        })
    }

    /// Returns the depth-ordered graph.
    pub fn graph(&self) -> &DirectedGraph {
        &self.graph
    }

    /// Returns the depth of each node index.
    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    /// Returns the depth of the node with the given
    /// genome id, if it is part of the graph.
    pub fn depth_of(&self, node_id: Innovation) -> Option<usize> {
        self.graph
            .node_ids
            .iter()
            .position(|&id| id == node_id)
            .map(|i| self.depths[i])
    }

    /// Returns the layers, in increasing depth.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the node index of each output.
    pub fn output_node_indices(&self) -> &[usize] {
        &self.output_node_indices
    }
}

/// Kahn's algorithm, relaxing each node's depth as its
/// sources are visited. Returns `None` on a cycle.
fn longest_path_depths(graph: &DirectedGraph) -> Option<Vec<usize>> {
    let node_count = graph.node_count();
    let mut in_degree = vec![0usize; node_count];
    // Connections are sorted by source, so each node's
    // outgoing run starts at `first_outgoing[node]`.
    let mut first_outgoing = vec![0usize; node_count + 1];
    for &(s, t) in &graph.connections {
        in_degree[t] += 1;
        first_outgoing[s + 1] += 1;
    }
    for i in 0..node_count {
        first_outgoing[i + 1] += first_outgoing[i];
    }

    let mut depths = vec![0usize; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        for &(_, target) in &graph.connections[first_outgoing[node]..first_outgoing[node + 1]] {
            depths[target] = depths[target].max(depths[node] + 1);
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                queue.push_back(target);
            }
        }
    }

    (visited == node_count).then(|| depths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_partition_nodes_and_connections() {
        // 0 -> 4 -> 3 -> 2, 1 -> 3, 0 -> 2
        let graph = DirectedGraph::from_connections(
            &[0, 1],
            &[2],
            &[(0, 4, 1.0), (4, 3, 1.0), (3, 2, 1.0), (1, 3, 1.0), (0, 2, 1.0)],
        );
        let graph = AcyclicGraph::new(graph).unwrap();

        assert_eq!(graph.depths(), &[0, 0, 1, 2, 3]);
        assert_eq!(graph.graph().node_ids(), &[0, 1, 4, 3, 2]);
        assert_eq!(graph.output_node_indices(), &[4]);
        assert_eq!(
            graph.layers(),
            &[
                Layer { end_node: 2, end_connection: 3 },
                Layer { end_node: 3, end_connection: 4 },
                Layer { end_node: 4, end_connection: 5 },
                Layer { end_node: 5, end_connection: 5 },
            ]
        );
        // Every connection leaves an earlier layer than it enters.
        let depths = graph.depths();
        assert!(graph
            .graph()
            .connections()
            .iter()
            .all(|&(s, t)| depths[s] < depths[t]));
    }

    #[test]
    fn unconnected_graph_is_single_layer() {
        let graph = AcyclicGraph::new(DirectedGraph::from_connections(&[0, 1], &[2, 3], &[])).unwrap();
        assert_eq!(graph.layers(), &[Layer { end_node: 4, end_connection: 0 }]);
        assert_eq!(graph.output_node_indices(), &[2, 3]);
    }

    #[test]
    fn cycle_is_rejected() {
        let graph = DirectedGraph::from_connections(&[0], &[1], &[(0, 2, 1.0), (2, 3, 1.0), (3, 2, 1.0), (3, 1, 1.0)]);
        assert_eq!(AcyclicGraph::new(graph), Err(NetworkError::CyclicGraph));
    }
}
