//! Configuration loading.
//!
//! The evolution core itself only ever needs the parameter structs in
//! [`crate::params`] as plain values — callers are free to build them by hand.
//! This module is a convenience layer on top of that: a `NeatSettings`
//! aggregate that can be loaded from a TOML file (with environment overrides
//! prefixed `NEAT_`) via the `config` crate, the way
//! `examples/SilvanCodes-novel-set-neat` loads its `Parameters` struct.
//! Nothing here is load-bearing for the algorithm in `genome`/`species`/
//! `generation` — it exists purely so a host program doesn't have to
//! hand-assemble every percentage and coefficient in source.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::params::{CompatDistParams, GenomeLayout, MutateParams};

/// Generation-level knobs that spec.md §4.4 threads through
/// `speciate`/`reproduce` as loose arguments; bundled here for config-file
/// loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReproductionSettings {
    pub population_size: usize,
    pub compatibility_threshold: f64,
    pub stagnation_threshold: usize,
    pub kill_percent: f64,
    pub mutation_offspring_percent: f64,
}

impl Default for ReproductionSettings {
    fn default() -> Self {
        ReproductionSettings {
            population_size: 150,
            compatibility_threshold: 3.0,
            stagnation_threshold: 15,
            kill_percent: 0.5,
            mutation_offspring_percent: 0.25,
        }
    }
}

/// The full set of knobs for a run, loadable as a unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct NeatSettings {
    pub layout: GenomeLayoutSettings,
    pub compat: CompatDistParams,
    pub mutate: MutateParams,
    pub reproduction: ReproductionSettings,
}

/// `GenomeLayout` mirrored here so it can derive `Default` (the real
/// `GenomeLayout` has no sensible default input/output count).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenomeLayoutSettings {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub output_activation: Activation,
}

impl Default for GenomeLayoutSettings {
    fn default() -> Self {
        GenomeLayoutSettings {
            n_inputs: 1,
            n_outputs: 1,
            output_activation: Activation::Sigmoid,
        }
    }
}

impl From<GenomeLayoutSettings> for GenomeLayout {
    fn from(s: GenomeLayoutSettings) -> Self {
        GenomeLayout::new(s.n_inputs, s.n_outputs, s.output_activation)
    }
}

impl NeatSettings {
    /// Load settings from a TOML file, with environment variables prefixed
    /// `NEAT_` (double-underscore separated, e.g. `NEAT_REPRODUCTION__KILL_PERCENT`)
    /// overriding individual fields.
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&NeatSettings::default())?)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("NEAT").separator("__"))
            .build()?
            .try_deserialize()
    }
}
