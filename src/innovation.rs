//! The innovation registry (C1): process-wide historical marking.
//!
//! Two monotonic counters and two lookup tables turn structural coincidence
//! into identity — the same `(in, out)` connection minted independently by
//! two genomes gets the same innovation id, and the same connection split
//! gets the same new hidden-node id. This is what makes
//! [`crate::genome::Genome::compatibility_distance`] linear in gene count
//! instead of requiring graph isomorphism.
//!
//! Re-expressed here as an owned value threaded through [`crate::generation::Generation`]
//! rather than the process globals the original implementation used
//! (`INNOV_DATABASE` / `NODE_DATABASE` in `Genome.cpp`), per spec.md §9.

use std::collections::HashMap;

/// Registry id minted when a connection `(in, out)` is split by `add_node`.
/// Bundles the new hidden node id together with the innovation ids of its
/// two replacement connections, since all three are always minted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitIds {
    pub node_id: usize,
    pub in_to_new: usize,
    pub new_to_out: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InnovationRegistry {
    next_node_id: usize,
    next_innovation_id: usize,
    connection_registry: HashMap<(usize, usize), usize>,
    node_registry: HashMap<(usize, usize), SplitIds>,
}

impl InnovationRegistry {
    /// A fresh registry. `first_node_id` should be one past the last id
    /// reserved for the initial population's input/output nodes so hidden
    /// node ids never collide with them.
    pub fn new(first_node_id: usize) -> Self {
        InnovationRegistry {
            next_node_id: first_node_id,
            next_innovation_id: 0,
            connection_registry: HashMap::new(),
            node_registry: HashMap::new(),
        }
    }

    /// Mint a fresh node id, bypassing the split registry. Used only for
    /// nodes that are not the result of splitting a connection (the initial
    /// population's input/output/bias nodes).
    pub fn new_node_id(&mut self) -> usize {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Returns the existing innovation id for `(in, out)` if one has already
    /// been assigned anywhere in this run; otherwise mints and records a new
    /// one.
    pub fn register_connection(&mut self, in_node: usize, out_node: usize) -> usize {
        if let Some(&id) = self.connection_registry.get(&(in_node, out_node)) {
            return id;
        }
        let id = self.next_innovation_id;
        self.next_innovation_id += 1;
        self.connection_registry.insert((in_node, out_node), id);
        id
    }

    /// Returns the existing split-ids for `(in, out)` if this exact
    /// connection has already been split anywhere in this run; otherwise
    /// mints a new hidden node id and two new connection innovation ids.
    pub fn register_split(&mut self, in_node: usize, out_node: usize) -> SplitIds {
        if let Some(&ids) = self.node_registry.get(&(in_node, out_node)) {
            return ids;
        }
        let node_id = self.new_node_id();
        let ids = SplitIds {
            node_id,
            in_to_new: self.register_connection(in_node, node_id),
            new_to_out: self.register_connection(node_id, out_node),
        };
        self.node_registry.insert((in_node, out_node), ids);
        ids
    }

    /// Forget that `(in, out)` was ever split, so a future `register_split`
    /// on the same pair mints a fresh node id rather than reusing a stale
    /// one. Called when a connection is re-enabled, and when equal-fitness
    /// crossover merges two genomes that may have split the same connection
    /// into historically-unrelated hidden nodes (spec.md §4.1, §4.2).
    pub fn forget_split(&mut self, in_node: usize, out_node: usize) {
        self.node_registry.remove(&(in_node, out_node));
    }
}
