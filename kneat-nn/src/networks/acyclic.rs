use crate::activation::ActivationFunction;
use crate::errors::NetworkError;
use crate::graphs::AcyclicGraph;

use std::fmt;

/// A feed-forward network, activated layer by
/// layer in a single pass.
#[derive(Clone, Debug)]
pub struct AcyclicNetwork {
    graph: AcyclicGraph,
    activation: ActivationFunction,
    activations: Box<[f64]>,
}

impl AcyclicNetwork {
    /// Creates a network over a depth-layered graph,
    /// with all node values at 0.
    pub fn new(graph: AcyclicGraph, activation: ActivationFunction) -> AcyclicNetwork {
        let node_count = graph.graph().node_count();
        AcyclicNetwork {
            graph,
            activation,
            activations: vec![0.0; node_count].into(),
        }
    }

    /// Sets the value of each input node to the
    /// corresponding value in `inputs`.
    ///
    /// # Errors
    /// Returns an error if the length of `inputs` is not
    /// the network's input count.
    pub fn set_inputs(&mut self, inputs: &[f64]) -> Result<(), NetworkError> {
        let input_count = self.graph.graph().input_count();
        if inputs.len() != input_count {
            return Err(NetworkError::InputCount {
                expected: input_count,
                found: inputs.len(),
            });
        }
        self.activations[..input_count].copy_from_slice(inputs);
        Ok(())
    }

    /// Recomputes every non-input node from the current inputs.
    ///
    /// Nodes of a layer are activated once all connections
    /// into them, which leave earlier layers, have been
    /// accumulated; then the layer's own connections fire.
    pub fn activate(&mut self) {
        let graph = self.graph.graph();
        let connections = graph.connections();
        let weights = graph.weights();
        let input_count = graph.input_count();
        let f = self.activation.function();

        self.activations[input_count..].fill(0.0);

        let (mut node, mut connection) = (input_count, 0);
        for layer in self.graph.layers() {
            for value in &mut self.activations[node..layer.end_node] {
                *value = f(*value);
            }
            node = layer.end_node;

            for c in connection..layer.end_connection {
                let (source, target) = connections[c];
                self.activations[target] += self.activations[source] * weights[c];
            }
            connection = layer.end_connection;
        }
    }

    /// Returns the current output node values.
    pub fn outputs(&self) -> Vec<f64> {
        self.graph
            .output_node_indices()
            .iter()
            .map(|&i| self.activations[i])
            .collect()
    }

    /// Sets the inputs, activates, and returns the outputs.
    ///
    /// # Errors
    /// Returns an error if the length of `inputs` is not
    /// the network's input count.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::graphs::{AcyclicGraph, DirectedGraph};
    /// use kneat_nn::networks::AcyclicNetwork;
    /// use kneat_nn::ActivationFunction;
    ///
    /// let graph = DirectedGraph::from_connections(
    ///     &[0, 1],
    ///     &[3],
    ///     &[(0, 2, 0.5), (1, 2, 0.3), (2, 3, 0.8)],
    /// );
    /// let mut network = AcyclicNetwork::new(
    ///     AcyclicGraph::new(graph).unwrap(),
    ///     ActivationFunction::LinearClamped,
    /// );
    ///
    /// assert_eq!(network.activate_with(&[1.0, 0.0]).unwrap(), vec![0.4]);
    /// ```
    pub fn activate_with(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.set_inputs(inputs)?;
        self.activate();
        Ok(self.outputs())
    }

    pub fn activation_function(&self) -> ActivationFunction {
        self.activation
    }
}

impl fmt::Display for AcyclicNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
