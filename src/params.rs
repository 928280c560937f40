//! Parameter value-objects (C5): mutation rates, compatibility coefficients,
//! and initial layout.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

/// Coefficients for `Genome::compatibility_distance` (spec.md §4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompatDistParams {
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub normalize_threshold: usize,
}

impl Default for CompatDistParams {
    fn default() -> Self {
        CompatDistParams {
            c1: 1.0,
            c2: 1.0,
            c3: 0.4,
            normalize_threshold: 20,
        }
    }
}

/// Gate percentages (each in `[0, 100]`) and activation choice for
/// `Genome::mutate` (spec.md §4.2, §4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutateParams {
    pub mutate_weight_pct: u32,
    pub rng_reset_pct: u32,
    pub add_node_pct: u32,
    pub hidden_activation: Activation,
    pub add_connection_pct: u32,
}

impl Default for MutateParams {
    fn default() -> Self {
        MutateParams {
            mutate_weight_pct: 80,
            rng_reset_pct: 10,
            add_node_pct: 3,
            hidden_activation: Activation::Sigmoid,
            add_connection_pct: 5,
        }
    }
}

/// The shape of the initial, minimal population (spec.md §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenomeLayout {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub output_activation: Activation,
}

impl GenomeLayout {
    pub fn new(n_inputs: usize, n_outputs: usize, output_activation: Activation) -> Self {
        GenomeLayout {
            n_inputs,
            n_outputs,
            output_activation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mutate_params_are_in_range() {
        let p = MutateParams::default();
        assert!(p.mutate_weight_pct <= 100);
        assert!(p.rng_reset_pct <= 100);
        assert!(p.add_node_pct <= 100);
        assert!(p.add_connection_pct <= 100);
    }
}
