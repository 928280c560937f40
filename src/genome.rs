//! The genome (C2): a DAG of typed nodes and weighted connections.
//!
//! Owns the mutation operators, forward evaluation, compatibility distance,
//! and crossover. Node and connection storage is a pair of ordered `Vec`s
//! (spec.md §9's "contiguous vectors throughout" design note), backed by two
//! `HashMap` indices — `(in, out) -> connection index` and `node id -> node
//! index` — so `add_connection`'s duplicate-edge check and `propagate`'s
//! source lookups stay close to O(1) instead of the teacher's linear scans.

use std::collections::{HashMap, HashSet};

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::activation::Activation;
use crate::connection::Connection;
use crate::error::{check_percent, NeatError, Result};
use crate::innovation::InnovationRegistry;
use crate::node::{Node, NodeKind};
use crate::params::CompatDistParams;

/// A single organism: a DAG of node genes and connection genes.
#[derive(Debug, Clone)]
pub struct Genome {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub fitness: f64,
    n_inputs: usize,
    n_outputs: usize,
    node_index: HashMap<usize, usize>,
    connection_index: HashMap<(usize, usize), usize>,
}

impl Genome {
    /// A minimal genome: every input connected to every output, no hidden
    /// nodes. `registry` mints the connection innovation ids; the node ids
    /// themselves come directly from the layout (spec.md §4.2), so the
    /// registry's node counter must already start past `n_in + n_out` (see
    /// [`InnovationRegistry::new`]).
    pub fn new(
        n_inputs: usize,
        n_outputs: usize,
        output_activation: Activation,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Self {
        let mut nodes = Vec::with_capacity(n_inputs + n_outputs);
        for id in 1..=n_inputs {
            nodes.push(Node::input(id));
        }
        for id in (n_inputs + 1)..=(n_inputs + n_outputs) {
            nodes.push(Node::output(id, output_activation));
        }

        let mut connections = Vec::with_capacity(n_inputs * n_outputs);
        for in_id in 1..=n_inputs {
            for out_id in (n_inputs + 1)..=(n_inputs + n_outputs) {
                let innovation = registry.register_connection(in_id, out_id);
                let weight = rng.random_range(-2.0..2.0);
                connections.push(Connection::new(innovation, in_id, out_id, weight));
            }
        }

        Genome::from_parts(nodes, connections, n_inputs, n_outputs)
    }

    /// Build a genome from an already-valid node/connection list (used by
    /// `crossover`). No registry interaction and no invariant checking beyond
    /// rebuilding the lookup indices — the caller must uphold spec.md §3's
    /// invariants.
    pub fn from_parts(
        nodes: Vec<Node>,
        connections: Vec<Connection>,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Self {
        let node_index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let connection_index = connections
            .iter()
            .enumerate()
            .map(|(i, c)| (c.endpoints(), i))
            .collect();
        Genome {
            nodes,
            connections,
            fitness: 0.0,
            n_inputs,
            n_outputs,
            node_index,
            connection_index,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    fn node_kind(&self, id: usize) -> NodeKind {
        self.nodes[self.node_index[&id]].kind
    }

    fn gate_fires(percent: u32, rng: &mut impl Rng) -> bool {
        rng.random_range(1..=100) <= percent
    }

    // ---- mutation operators (spec.md §4.2) --------------------------------

    /// With probability `p_reset` reset each connection's weight to a fresh
    /// uniform sample in `[-2, 2]`; otherwise nudge it by multiplying by a
    /// uniform sample in `[0, 2]`.
    pub fn mutate_weight(&mut self, p: u32, p_reset: u32, rng: &mut impl Rng) -> Result<()> {
        check_percent(p)?;
        check_percent(p_reset)?;
        if !Self::gate_fires(p, rng) {
            return Ok(());
        }
        for i in 0..self.connections.len() {
            self.reroll_weight(i, p_reset, rng);
        }
        Ok(())
    }

    fn reroll_weight(&mut self, idx: usize, p_reset: u32, rng: &mut impl Rng) {
        if Self::gate_fires(p_reset, rng) {
            self.connections[idx].weight = rng.random_range(-2.0..2.0);
        } else {
            self.connections[idx].weight *= rng.random_range(0.0..2.0);
        }
    }

    /// Split a uniformly-chosen enabled connection with a new hidden node.
    /// The registry guarantees two genomes splitting the same connection get
    /// the same node id and the same two new innovation ids.
    pub fn add_node(
        &mut self,
        p: u32,
        hidden_activation: Activation,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Result<()> {
        check_percent(p)?;
        if !Self::gate_fires(p, rng) {
            return Ok(());
        }
        let Some(chosen) = (0..self.connections.len())
            .filter(|&i| self.connections[i].enabled)
            .choose(rng)
        else {
            return Ok(());
        };

        let (in_node, out_node, weight) = {
            let c = &self.connections[chosen];
            (c.in_node, c.out_node, c.weight)
        };
        let split = registry.register_split(in_node, out_node);

        self.connections[chosen].enabled = false;

        if !self.node_index.contains_key(&split.node_id) {
            let node = Node::hidden(split.node_id, hidden_activation);
            self.node_index.insert(node.id, self.nodes.len());
            self.nodes.push(node);
        }

        self.push_connection(Connection::new(split.in_to_new, in_node, split.node_id, 1.0));
        self.push_connection(Connection::new(
            split.new_to_out,
            split.node_id,
            out_node,
            weight,
        ));
        Ok(())
    }

    fn push_connection(&mut self, conn: Connection) {
        self.connection_index
            .insert(conn.endpoints(), self.connections.len());
        self.connections.push(conn);
    }

    /// Add a new connection while preserving acyclicity. See spec.md §4.2 for
    /// the six-step procedure; the bound on resampling attempts (rather than
    /// looping forever, as the original C++ can) is a deliberate
    /// robustness addition — it only matters when no legal destination
    /// exists at all, which the original leaves as an infinite loop.
    pub fn add_connection(&mut self, p: u32, registry: &mut InnovationRegistry, rng: &mut impl Rng) -> Result<()> {
        check_percent(p)?;
        if !Self::gate_fires(p, rng) {
            return Ok(());
        }

        let non_output_ids: Vec<usize> = self
            .nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Output)
            .map(|n| n.id)
            .collect();
        if non_output_ids.is_empty() {
            return Ok(());
        }

        let max_attempts = self.nodes.len() * self.nodes.len() + 1;
        let mut attempts = 0usize;
        let mut tried_sources: HashSet<usize> = HashSet::new();

        loop {
            if attempts >= max_attempts {
                return Ok(());
            }
            attempts += 1;

            let remaining_sources: Vec<usize> = non_output_ids
                .iter()
                .copied()
                .filter(|id| !tried_sources.contains(id))
                .collect();
            let Some(&s_id) = remaining_sources.iter().choose(rng) else {
                return Ok(());
            };

            let mut tried_dests: HashSet<usize> = HashSet::new();
            loop {
                let candidates: Vec<usize> = self
                    .nodes
                    .iter()
                    .filter(|n| {
                        n.kind != NodeKind::Input && n.id != s_id && !tried_dests.contains(&n.id)
                    })
                    .map(|n| n.id)
                    .collect();
                let Some(&d_id) = candidates.iter().choose(rng) else {
                    tried_sources.insert(s_id);
                    break;
                };

                if let Some(&idx) = self.connection_index.get(&(s_id, d_id)) {
                    self.reroll_weight(idx, 100, rng);
                    return Ok(());
                }

                let s_kind = self.node_kind(s_id);
                let d_kind = self.node_kind(d_id);
                let accept = s_kind == NodeKind::Input
                    || d_kind == NodeKind::Output
                    || self.reachable_after_adding(s_id, d_id);

                if accept {
                    let innovation = registry.register_connection(s_id, d_id);
                    let weight = rng.random_range(-2.0..2.0);
                    self.push_connection(Connection::new(innovation, s_id, d_id, weight));
                    return Ok(());
                }

                tried_dests.insert(d_id);
            }
        }
    }

    /// Run all three structural/weight mutation operators in the order
    /// `Genome::Mutate`'s body actually executes them in: weight mutation,
    /// then node-splitting, then connection-adding (spec.md §9, the
    /// vestigial `ToggleConnect` note).
    pub fn mutate(
        &mut self,
        params: &crate::params::MutateParams,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Result<()> {
        self.mutate_weight(params.mutate_weight_pct, params.rng_reset_pct, rng)?;
        self.add_node(params.add_node_pct, params.hidden_activation, registry, rng)?;
        self.add_connection(params.add_connection_pct, registry, rng)?;
        Ok(())
    }

    /// The level-synchronous reachability pre-check (spec.md §4.2): would
    /// every non-input node still be computable if `(s, d)` were added?
    fn reachable_after_adding(&self, s: usize, d: usize) -> bool {
        let mut ready: HashMap<usize, bool> = self
            .nodes
            .iter()
            .map(|n| (n.id, n.kind == NodeKind::Input))
            .collect();

        let mut edges: Vec<(usize, usize)> = self
            .connections
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.endpoints())
            .collect();
        edges.push((s, d));

        let max_rounds = (self.nodes.len() - self.n_inputs).max(1);
        for _ in 0..max_rounds {
            let mut progressed = false;
            for n in &self.nodes {
                if n.kind == NodeKind::Input || ready[&n.id] {
                    continue;
                }
                let all_ready = edges
                    .iter()
                    .filter(|(_, out)| *out == n.id)
                    .all(|(src, _)| ready[src]);
                if all_ready {
                    ready.insert(n.id, true);
                    progressed = true;
                }
            }
            if ready.values().all(|&v| v) {
                return true;
            }
            if !progressed {
                return false;
            }
        }
        ready.values().all(|&v| v)
    }

    // ---- evaluation (spec.md §4.2) ----------------------------------------

    /// Evaluate the network on `inputs`, returning output-node values in
    /// node order. Deterministic in weights: calling it twice on the same
    /// inputs yields identical outputs.
    pub fn propagate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.n_inputs {
            return Err(NeatError::BadInputLength {
                expected: self.n_inputs,
                got: inputs.len(),
            });
        }

        let mut computed: Vec<bool> = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if node.kind == NodeKind::Input {
                node.value = inputs[i];
                computed[i] = true;
            } else {
                node.value = 0.0;
            }
        }

        let max_rounds = (self.nodes.len() - self.n_inputs).max(1);
        for _ in 0..max_rounds {
            let mut progressed = false;
            for idx in 0..self.nodes.len() {
                if computed[idx] || self.nodes[idx].kind == NodeKind::Input {
                    continue;
                }
                let node_id = self.nodes[idx].id;
                let incoming: Vec<&Connection> = self
                    .connections
                    .iter()
                    .filter(|c| c.enabled && c.out_node == node_id)
                    .collect();
                let all_ready = incoming
                    .iter()
                    .all(|c| computed[self.node_index[&c.in_node]]);
                if !all_ready {
                    continue;
                }
                let sum: f64 = incoming
                    .iter()
                    .map(|c| self.nodes[self.node_index[&c.in_node]].value * c.weight)
                    .sum();
                let activation = self.nodes[idx].activation;
                self.nodes[idx].value = activation.apply(sum);
                computed[idx] = true;
                progressed = true;
            }
            if computed.iter().all(|&c| c) {
                break;
            }
            if !progressed {
                break;
            }
        }

        Ok(self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Output)
            .map(|n| n.value)
            .collect())
    }

    // ---- compatibility distance (spec.md §4.2) ----------------------------

    pub fn compatibility_distance(&self, other: &Genome, params: &CompatDistParams) -> f64 {
        let max_self = self.connections.iter().map(|c| c.innovation).max().unwrap_or(0);
        let max_other = other.connections.iter().map(|c| c.innovation).max().unwrap_or(0);

        let self_by_innov: HashMap<usize, &Connection> =
            self.connections.iter().map(|c| (c.innovation, c)).collect();
        let other_by_innov: HashMap<usize, &Connection> =
            other.connections.iter().map(|c| (c.innovation, c)).collect();

        let all_innovations: HashSet<usize> = self_by_innov
            .keys()
            .chain(other_by_innov.keys())
            .copied()
            .collect();

        let mut excess = 0usize;
        let mut disjoint = 0usize;
        let mut matching = 0usize;
        let mut weight_diff_sum = 0.0;

        for innov in all_innovations {
            match (self_by_innov.get(&innov), other_by_innov.get(&innov)) {
                (Some(a), Some(b)) => {
                    matching += 1;
                    weight_diff_sum += (a.weight - b.weight).abs();
                }
                (Some(_), None) => {
                    if innov > max_other {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                }
                (None, Some(_)) => {
                    if innov > max_self {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                }
                (None, None) => unreachable!(),
            }
        }

        let mut n = self.connections.len().max(other.connections.len());
        if n < params.normalize_threshold {
            n = 1;
        }
        let n = n as f64;

        let w_bar = if matching > 0 {
            weight_diff_sum / matching as f64
        } else {
            0.0
        };

        params.c1 * excess as f64 / n + params.c2 * disjoint as f64 / n + params.c3 * w_bar
    }

    // ---- crossover (spec.md §4.2) -----------------------------------------

    /// Breed `self` with `other`. `forget_split` is invoked on every enabled
    /// connection of an equal-fitness child so a later `add_node` mints a
    /// fresh id rather than colliding with an id either parent used for a
    /// different topological split (spec.md §4.1, §9 "Open questions").
    pub fn crossover(
        &self,
        other: &Genome,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Genome {
        use std::cmp::Ordering;
        match self.fitness.partial_cmp(&other.fitness).unwrap_or(Ordering::Equal) {
            Ordering::Greater => self.crossover_unequal(other, rng),
            Ordering::Less => other.crossover_unequal(self, rng),
            Ordering::Equal => self.crossover_equal(other, registry, rng),
        }
    }

    fn crossover_unequal(&self, less_fit: &Genome, rng: &mut impl Rng) -> Genome {
        let less_by_innov: HashMap<usize, &Connection> = less_fit
            .connections
            .iter()
            .map(|c| (c.innovation, c))
            .collect();

        let child_connections: Vec<Connection> = self
            .connections
            .iter()
            .map(|c| {
                let mut gene = *c;
                if let Some(other_gene) = less_by_innov.get(&c.innovation) {
                    if rng.random_bool(0.5) {
                        gene.weight = other_gene.weight;
                    }
                }
                gene
            })
            .collect();

        Genome::from_parts(self.nodes.clone(), child_connections, self.n_inputs, self.n_outputs)
    }

    fn crossover_equal(
        &self,
        other: &Genome,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Genome {
        let other_by_innov: HashMap<usize, &Connection> =
            other.connections.iter().map(|c| (c.innovation, c)).collect();

        let mut seen: HashSet<usize> = HashSet::new();
        let mut child_connections: Vec<Connection> = Vec::with_capacity(
            self.connections.len() + other.connections.len(),
        );

        for c in &self.connections {
            let mut gene = *c;
            if let Some(other_gene) = other_by_innov.get(&c.innovation) {
                if rng.random_bool(0.5) {
                    gene.weight = other_gene.weight;
                }
            }
            seen.insert(gene.innovation);
            child_connections.push(gene);
        }
        for c in &other.connections {
            if seen.insert(c.innovation) {
                child_connections.push(*c);
            }
        }

        let mut node_map: HashMap<usize, Node> = HashMap::new();
        for n in self.nodes.iter().chain(other.nodes.iter()) {
            node_map.entry(n.id).or_insert(*n);
        }
        let mut child_nodes: Vec<Node> = node_map.into_values().collect();
        child_nodes.sort_by_key(|n| n.id);

        for c in &child_connections {
            if c.enabled {
                registry.forget_split(c.in_node, c.out_node);
            }
        }

        Genome::from_parts(child_nodes, child_connections, self.n_inputs, self.n_outputs)
    }

    // ---- reproduction accounting (spec.md §4.2) ---------------------------

    /// `fitness /= species_size`, applied once per generation by
    /// `Species::calc_adjusted_fitness`.
    pub fn apply_fitness_sharing(&mut self, species_size: usize) {
        if species_size > 0 {
            self.fitness /= species_size as f64;
        }
    }

    /// Emit a tab-separated diagnostic table of node and connection genes.
    /// Format is not a compatibility surface (spec.md §6).
    pub fn print_genotype(&self) {
        log::debug!("Node Genes:");
        log::debug!("ID\tKIND\tVAL\tACT");
        for n in &self.nodes {
            log::debug!("{}\t{:?}\t{:.6}\t{:?}", n.id, n.kind, n.value, n.activation);
        }
        log::debug!("Connection Genes:");
        log::debug!("INNOV\tIN\tOUT\tWEIGHT\tENABLED");
        for c in &self.connections {
            log::debug!(
                "{}\t{}\t{}\t{:.6}\t{}",
                c.innovation,
                c.in_node,
                c.out_node,
                c.weight,
                c.enabled
            );
        }
    }

    /// Verify the acyclicity invariant (spec.md §3, §8) using `petgraph`,
    /// the way `src/genome.rs` in the teacher verified it with
    /// `petgraph::algo::is_cyclic_directed` after every `add_connection`.
    /// Exposed for tests; the evolution core itself never needs to run a
    /// generic cycle search because `add_connection`'s reachability
    /// pre-check prevents cycles from being introduced in the first place.
    #[cfg(test)]
    fn enabled_subgraph_is_acyclic(&self) -> bool {
        use petgraph::graph::DiGraph;
        let mut graph = DiGraph::<usize, ()>::new();
        let mut idx = HashMap::new();
        for n in &self.nodes {
            idx.insert(n.id, graph.add_node(n.id));
        }
        for c in &self.connections {
            if c.enabled {
                graph.add_edge(idx[&c.in_node], idx[&c.out_node], ());
            }
        }
        !petgraph::algo::is_cyclic_directed(&graph)
    }
}

/// The only surface a fitness function needs (spec.md §6): evaluate a
/// network on an input vector. `Genome` implements this directly rather
/// than through a separate "compiled network" type — unlike the teacher's
/// `FeedforwardNetwork`, spec.md's evaluation model has no distinct
/// pre-sorted-network stage, since genomes are small enough that
/// re-running the round-based evaluator per call is cheap.
pub trait GenomeView {
    fn propagate(&mut self, inputs: &[f64]) -> Result<Vec<f64>>;
}

impl GenomeView for Genome {
    fn propagate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        Genome::propagate(self, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn minimal_topology_matches_spec_scenario_1() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let g = Genome::new(3, 2, Activation::Linear, &mut registry, &mut r);

        assert_eq!(g.nodes.len(), 5);
        let mut ids: Vec<usize> = g.nodes.iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        assert_eq!(g.connections.len(), 6);
        let mut innovs: Vec<usize> = g.connections.iter().map(|c| c.innovation).collect();
        innovs.sort();
        innovs.dedup();
        assert_eq!(innovs.len(), 6);
        assert!(g.connections.iter().all(|c| c.enabled));
        assert!(g.connections.iter().all(|c| c.weight >= -2.0 && c.weight < 2.0));
    }

    #[test]
    fn propagate_output_is_bounded_for_minimal_genome() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(3, 2, Activation::Linear, &mut registry, &mut r);
        let outputs = g.propagate(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(outputs.len(), 2);
        for o in outputs {
            assert!(o.abs() <= 2.0 * (1.0 + 2.0 + 3.0));
        }
    }

    #[test]
    fn propagate_rejects_wrong_input_length() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(3, 2, Activation::Linear, &mut registry, &mut r);
        let err = g.propagate(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, NeatError::BadInputLength { expected: 3, got: 2 }));
    }

    #[test]
    fn propagate_is_deterministic() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(3, 2, Activation::Linear, &mut registry, &mut r);
        let a = g.propagate(&[0.5, -0.5, 1.0]).unwrap();
        let b = g.propagate(&[0.5, -0.5, 1.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn add_node_preserves_output_matches_spec_scenario_2() {
        let mut registry = InnovationRegistry::new(2);
        let mut r = rng();
        let innovation = registry.register_connection(1, 2);
        let nodes = vec![Node::input(1), Node::output(2, Activation::Linear)];
        let connections = vec![Connection::new(innovation, 1, 2, 0.5)];
        let mut g = Genome::from_parts(nodes, connections, 1, 1);

        assert_eq!(g.propagate(&[2.0]).unwrap(), vec![1.0]);

        g.add_node(100, Activation::Linear, &mut registry, &mut r).unwrap();

        assert_eq!(g.propagate(&[2.0]).unwrap(), vec![1.0]);
        assert_eq!(g.nodes.len(), 3);
        assert!(!g.connections[0].enabled);
    }

    #[test]
    fn add_connection_never_creates_a_cycle_matches_spec_scenario_3() {
        let mut registry = InnovationRegistry::new(4);
        let mut r = rng();
        // chain: input(1) -> h1(3) -> h2(4) -> output(2)
        let i1 = registry.register_connection(1, 3);
        let i2 = registry.register_connection(3, 4);
        let i3 = registry.register_connection(4, 2);
        let nodes = vec![
            Node::input(1),
            Node::output(2, Activation::Linear),
            Node::hidden(3, Activation::Linear),
            Node::hidden(4, Activation::Linear),
        ];
        let connections = vec![
            Connection::new(i1, 1, 3, 1.0),
            Connection::new(i2, 3, 4, 1.0),
            Connection::new(i3, 4, 2, 1.0),
        ];
        let mut g = Genome::from_parts(nodes, connections, 1, 1);

        for _ in 0..100 {
            g.add_connection(100, &mut registry, &mut r).unwrap();
            assert!(g.enabled_subgraph_is_acyclic());
        }
    }

    #[test]
    fn compatibility_distance_is_zero_for_identical_genome() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let g = Genome::new(3, 1, Activation::Linear, &mut registry, &mut r);
        let params = CompatDistParams::default();
        assert_eq!(g.compatibility_distance(&g, &params), 0.0);
    }

    #[test]
    fn compatibility_distance_is_symmetric_matches_spec_scenario_4() {
        let mut registry = InnovationRegistry::new(4);
        let mut r1 = StdRng::seed_from_u64(1);
        let mut r2 = StdRng::seed_from_u64(2);
        let mut a = Genome::new(3, 1, Activation::Linear, &mut registry, &mut r1);
        let mut b = Genome::new(3, 1, Activation::Linear, &mut registry, &mut r2);

        let mutate_params = crate::params::MutateParams::default();
        for _ in 0..3 {
            a.mutate(&mutate_params, &mut registry, &mut r1).unwrap();
            b.mutate(&mutate_params, &mut registry, &mut r2).unwrap();
        }

        let params = CompatDistParams::default();
        let d_ab = a.compatibility_distance(&b, &params);
        let d_ba = b.compatibility_distance(&a, &params);
        assert!((d_ab - d_ba).abs() < 1e-9);
        assert!(d_ab >= 0.0);
    }

    #[test]
    fn no_connection_has_self_loop() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(3, 1, Activation::Sigmoid, &mut registry, &mut r);
        let mutate_params = crate::params::MutateParams::default();
        for _ in 0..20 {
            g.mutate(&mutate_params, &mut registry, &mut r).unwrap();
        }
        assert!(g.connections.iter().all(|c| c.in_node != c.out_node));
    }

    #[test]
    fn node_ids_and_connection_pairs_stay_unique_under_mutation() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(3, 1, Activation::Sigmoid, &mut registry, &mut r);
        let mutate_params = crate::params::MutateParams::default();
        for _ in 0..30 {
            g.mutate(&mutate_params, &mut registry, &mut r).unwrap();
        }
        let mut ids: Vec<usize> = g.nodes.iter().map(|n| n.id).collect();
        let unique_ids: HashSet<usize> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique_ids.len());
        ids.sort();

        let pairs: HashSet<(usize, usize)> =
            g.connections.iter().map(|c| c.endpoints()).collect();
        assert_eq!(pairs.len(), g.connections.len());
    }

    #[test]
    fn same_add_connection_event_yields_same_innovation_across_genomes() {
        let mut registry = InnovationRegistry::new(10);
        let a = registry.register_connection(2, 7);
        let b = registry.register_connection(2, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn same_split_event_yields_same_node_id_across_genomes() {
        let mut registry = InnovationRegistry::new(10);
        let a = registry.register_split(2, 7);
        let b = registry.register_split(2, 7);
        assert_eq!(a.node_id, b.node_id);
    }

    #[test]
    fn mutate_weight_rejects_out_of_range_percent() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut g = Genome::new(1, 1, Activation::Linear, &mut registry, &mut r);
        let err = g.mutate_weight(101, 50, &mut r).unwrap_err();
        assert!(matches!(err, NeatError::BadRange { .. }));
    }

    #[test]
    fn crossover_unequal_fitness_inherits_fitter_structure() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let mut a = Genome::new(2, 1, Activation::Linear, &mut registry, &mut r);
        let mut b = a.clone();
        a.fitness = 5.0;
        b.fitness = 1.0;
        b.add_node(100, Activation::Linear, &mut registry, &mut r).unwrap();

        let child = a.crossover(&b, &mut registry, &mut r);
        assert_eq!(child.nodes.len(), a.nodes.len());
    }

    #[test]
    fn crossover_equal_fitness_merges_node_sets() {
        let mut registry = InnovationRegistry::new(6);
        let mut r = rng();
        let a = Genome::new(2, 1, Activation::Linear, &mut registry, &mut r);
        let mut b = a.clone();
        b.add_node(100, Activation::Linear, &mut registry, &mut r).unwrap();

        let child = a.crossover(&b, &mut registry, &mut r);
        assert_eq!(child.nodes.len(), b.nodes.len());
    }
}
