//! Node genes.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

/// The role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Output,
    Hidden,
}

/// A single node gene.
///
/// `id` is minted by the innovation registry and is stable across
/// generations; `value` is scratch space written during `Genome::propagate`
/// and carries no meaning between calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    pub kind: NodeKind,
    pub value: f64,
    pub activation: Activation,
}

impl Node {
    pub fn new(id: usize, kind: NodeKind, activation: Activation) -> Self {
        let activation = match kind {
            NodeKind::Input => Activation::None,
            _ => activation,
        };
        Node {
            id,
            kind,
            value: 0.0,
            activation,
        }
    }

    pub fn input(id: usize) -> Self {
        Node::new(id, NodeKind::Input, Activation::None)
    }

    pub fn output(id: usize, activation: Activation) -> Self {
        Node::new(id, NodeKind::Output, activation)
    }

    pub fn hidden(id: usize, activation: Activation) -> Self {
        Node::new(id, NodeKind::Hidden, activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_nodes_always_use_none_activation() {
        let n = Node::new(1, NodeKind::Input, Activation::Sigmoid);
        assert_eq!(n.activation, Activation::None);
    }

    #[test]
    fn output_and_hidden_keep_requested_activation() {
        let n = Node::output(2, Activation::Tanh);
        assert_eq!(n.activation, Activation::Tanh);
        let n = Node::hidden(3, Activation::Relu);
        assert_eq!(n.activation, Activation::Relu);
    }
}
