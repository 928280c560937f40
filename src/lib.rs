//! NEAT (NeuroEvolution of Augmenting Topologies): an evolutionary search
//! over directed acyclic neural networks whose topology and weights
//! co-evolve.
//!
//! This crate is the evolution core only: the genome data model and its
//! innovation registry, structural mutation, DAG evaluation, and the
//! speciation/crossover/reproduction accounting that drives a generation.
//! The fitness function, any CLI or persistence layer, and PRNG seeding
//! policy are the host's responsibility — see [`generation::Generation`]
//! for the embedding API.

pub mod activation;
pub mod config;
pub mod connection;
pub mod error;
pub mod generation;
pub mod genome;
pub mod innovation;
pub mod node;
pub mod params;
pub mod species;

pub use activation::Activation;
pub use connection::Connection;
pub use error::{NeatError, Result};
pub use generation::Generation;
pub use genome::{Genome, GenomeView};
pub use innovation::InnovationRegistry;
pub use node::{Node, NodeKind};
pub use params::{CompatDistParams, GenomeLayout, MutateParams};
pub use species::Species;
