//! Scalar activation functions applied to node
//! pre-activation sums.
use crate::errors::NetworkError;

use serde::{Deserialize, Serialize};

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// An ActivationFunction selects the function every
/// non-input node of a network applies to its summed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    // x
    Identity,
    // x clamped to [-1, 1]
    LinearClamped,
    // 1 / (1 + exp(-x))
    Logistic,
    // 1 / (1 + exp(-4.9x))
    LogisticSteep,
    // tanh(x)
    TanH,
    // max(0, x)
    ReLU,
    // x      if x > 0
    // 0.001x otherwise
    LeakyReLU,
    // leaky ReLU of x + 0.5
    LeakyReLUShifted,
    // atan(x) / (π/2)
    ArcTan,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sine,
    // x / (1 + |x|)
    SoftSign,
}

/// Dispatch table, indexed by variant discriminant.
static FUNCTIONS: [fn(f64) -> f64; ActivationFunction::ALL.len()] = [
    identity,
    linear_clamped,
    logistic,
    logistic_steep,
    tanh,
    relu,
    leaky_relu,
    leaky_relu_shifted,
    arctan,
    gaussian,
    sine,
    soft_sign,
];

impl ActivationFunction {
    /// Every activation function, in discriminant order.
    pub const ALL: [ActivationFunction; 12] = [
        Self::Identity,
        Self::LinearClamped,
        Self::Logistic,
        Self::LogisticSteep,
        Self::TanH,
        Self::ReLU,
        Self::LeakyReLU,
        Self::LeakyReLUShifted,
        Self::ArcTan,
        Self::Gaussian,
        Self::Sine,
        Self::SoftSign,
    ];

    /// Returns the function's canonical name,
    /// as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::LinearClamped => "LinearClamped",
            Self::Logistic => "Logistic",
            Self::LogisticSteep => "LogisticSteep",
            Self::TanH => "TanH",
            Self::ReLU => "ReLU",
            Self::LeakyReLU => "LeakyReLU",
            Self::LeakyReLUShifted => "LeakyReLUShifted",
            Self::ArcTan => "ArcTan",
            Self::Gaussian => "Gaussian",
            Self::Sine => "Sine",
            Self::SoftSign => "SoftSign",
        }
    }

    /// Returns the plain function pointer for this variant.
    pub fn function(self) -> fn(f64) -> f64 {
        FUNCTIONS[self as usize]
    }

    /// Applies the function to a single value.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::ActivationFunction;
    ///
    /// assert_eq!(ActivationFunction::Logistic.apply(0.0), 0.5);
    /// assert_eq!(ActivationFunction::LinearClamped.apply(3.0), 1.0);
    /// assert_eq!(ActivationFunction::ReLU.apply(-2.0), 0.0);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        FUNCTIONS[self as usize](x)
    }

    /// Applies the function in place to every value in `values`.
    pub fn apply_slice(self, values: &mut [f64]) {
        let f = self.function();
        for v in values {
            *v = f(*v);
        }
    }
}

impl Default for ActivationFunction {
    fn default() -> Self {
        Self::LeakyReLU
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = NetworkError;

    /// Looks a function up by name, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::ActivationFunction;
    ///
    /// assert_eq!("tanh".parse(), Ok(ActivationFunction::TanH));
    /// assert!("swish".parse::<ActivationFunction>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NetworkError::UnknownActivation(s.to_string()))
    }
}

fn identity(x: f64) -> f64 {
    x
}

fn linear_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logistic_steep(x: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

fn tanh(x: f64) -> f64 {
    x.tanh()
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

fn leaky_relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        x * 0.001
    }
}

fn leaky_relu_shifted(x: f64) -> f64 {
    leaky_relu(x + 0.5)
}

fn arctan(x: f64) -> f64 {
    x.atan() / (PI / 2.0)
}

fn gaussian(x: f64) -> f64 {
    (-x * x).exp()
}

fn sine(x: f64) -> f64 {
    (PI * x).sin()
}

fn soft_sign(x: f64) -> f64 {
    x / (1.0 + x.abs())
}
