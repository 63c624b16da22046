use crate::activation::ActivationFunction;
use crate::errors::NetworkError;
use crate::graphs::DirectedGraph;

use std::fmt;

/// Outcome of [`CyclicNetwork::relax`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelaxOutcome {
    /// No node value changed by more than the
    /// threshold in the given timestep.
    Converged(usize),
    /// The step limit was hit before convergence.
    MaxStepsReached,
}

/// An arbitrarily-structured network, activated for a fixed
/// number of timesteps. In each timestep every node reads
/// only values from the previous one.
#[derive(Clone, Debug)]
pub struct CyclicNetwork {
    graph: DirectedGraph,
    activation: ActivationFunction,
    cycles_per_activation: usize,
    input_sums: Box<[f64]>,
    activation_levels: Box<[f64]>,
}

impl CyclicNetwork {
    /// Creates a network over any graph, with
    /// all node values at 0.
    ///
    /// # Errors
    /// Returns [`NetworkError::ZeroCycles`] if
    /// `cycles_per_activation` is 0.
    pub fn new(
        graph: DirectedGraph,
        activation: ActivationFunction,
        cycles_per_activation: usize,
    ) -> Result<CyclicNetwork, NetworkError> {
        if cycles_per_activation == 0 {
            return Err(NetworkError::ZeroCycles);
        }
        let node_count = graph.node_count();
        Ok(CyclicNetwork {
            graph,
            activation,
            cycles_per_activation,
            input_sums: vec![0.0; node_count].into(),
            activation_levels: vec![0.0; node_count].into(),
        })
    }

    /// Sets the value of each input node to the
    /// corresponding value in `inputs`.
    ///
    /// # Errors
    /// Returns an error if the length of `inputs` is not
    /// the network's input count.
    pub fn set_inputs(&mut self, inputs: &[f64]) -> Result<(), NetworkError> {
        let input_count = self.graph.input_count();
        if inputs.len() != input_count {
            return Err(NetworkError::InputCount {
                expected: input_count,
                found: inputs.len(),
            });
        }
        self.activation_levels[..input_count].copy_from_slice(inputs);
        Ok(())
    }

    /// Runs `cycles_per_activation` timesteps.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::graphs::DirectedGraph;
    /// use kneat_nn::networks::CyclicNetwork;
    /// use kneat_nn::ActivationFunction;
    ///
    /// // The output feeds back into itself.
    /// let graph = DirectedGraph::from_connections(&[0], &[1], &[(0, 1, 1.0), (1, 1, -1.0)]);
    /// let mut network = CyclicNetwork::new(graph, ActivationFunction::Identity, 1).unwrap();
    ///
    /// network.set_inputs(&[1.0]).unwrap();
    /// network.activate();
    /// assert_eq!(network.outputs(), vec![1.0]);
    /// network.activate();
    /// assert_eq!(network.outputs(), vec![0.0]);
    /// ```
    pub fn activate(&mut self) {
        for _ in 0..self.cycles_per_activation {
            self.timestep();
        }
    }

    /// Runs single timesteps until no node value changes by
    /// more than `threshold`, for at most `max_steps` steps.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::graphs::DirectedGraph;
    /// use kneat_nn::networks::{CyclicNetwork, RelaxOutcome};
    /// use kneat_nn::ActivationFunction;
    ///
    /// let graph = DirectedGraph::from_connections(&[0], &[1], &[(0, 1, 1.0), (1, 1, 0.5)]);
    /// let mut network = CyclicNetwork::new(graph, ActivationFunction::Identity, 1).unwrap();
    /// network.set_inputs(&[1.0]).unwrap();
    ///
    /// // The output approaches 2 geometrically.
    /// assert!(matches!(network.relax(100, 1e-9), RelaxOutcome::Converged(_)));
    /// assert!((network.outputs()[0] - 2.0).abs() < 1e-8);
    /// ```
    pub fn relax(&mut self, max_steps: usize, threshold: f64) -> RelaxOutcome {
        for step in 1..=max_steps {
            if self.timestep() <= threshold {
                return RelaxOutcome::Converged(step);
            }
        }
        RelaxOutcome::MaxStepsReached
    }

    /// Clears the values of all non-input nodes.
    pub fn reset(&mut self) {
        let input_count = self.graph.input_count();
        self.input_sums[input_count..].fill(0.0);
        self.activation_levels[input_count..].fill(0.0);
    }

    /// Returns the current output node values.
    pub fn outputs(&self) -> Vec<f64> {
        let start = self.graph.input_count();
        self.activation_levels[start..start + self.graph.output_count()].to_vec()
    }

    pub fn cycles_per_activation(&self) -> usize {
        self.cycles_per_activation
    }

    pub fn activation_function(&self) -> ActivationFunction {
        self.activation
    }

    /// One timestep; returns the largest change in
    /// any node's value.
    fn timestep(&mut self) -> f64 {
        self.fire_nodes();
        self.compute_activations()
    }

    /// Propagates each node's value through its
    /// outgoing connections.
    fn fire_nodes(&mut self) {
        for (&(source, target), weight) in self.graph.connections().iter().zip(self.graph.weights()) {
            self.input_sums[target] += self.activation_levels[source] * weight;
        }
    }

    /// Computes each non-input node's value from its input
    /// sum, resetting the sum for the next timestep.
    fn compute_activations(&mut self) -> f64 {
        let input_count = self.graph.input_count();
        let f = self.activation.function();
        let mut max_delta: f64 = 0.0;
        for (input_sum, activation_level) in self.input_sums[input_count..]
            .iter_mut()
            .zip(&mut self.activation_levels[input_count..])
        {
            let level = f(*input_sum);
            max_delta = max_delta.max((level - *activation_level).abs());
            *activation_level = level;
            *input_sum = 0.0;
        }
        max_delta
    }
}

impl fmt::Display for CyclicNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
