//! Frame — one timestamp snapshot of the active nodes

use serde::Serialize;

use crate::node::{Node, NodeKind};

/// A single timestep containing every node active at that time.
///
/// Node identifiers are unique within a frame: when a node with an id that is
/// already present is added, the earlier one is removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    time: f64,
    nodes: Vec<Node>,
}

impl Frame {
    /// Build a frame, collapsing duplicate ids (later occurrence wins)
    pub fn new(time: f64, nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut frame = Self {
            time,
            nodes: Vec::new(),
        };
        for node in nodes {
            frame.insert(node);
        }
        frame
    }

    /// Add a node. Returns the node it replaced, if its id was already taken.
    pub(crate) fn insert(&mut self, node: Node) -> Option<Node> {
        let id = node.id();
        let replaced = self
            .nodes
            .iter()
            .position(|n| n.id() == id)
            .map(|index| self.nodes.remove(index));
        self.nodes.push(node);
        replaced
    }

    /// Timestamp in the owning scene's time unit
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_by_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn nodes_by_group(&self, group: u32) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.group() == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn test_duplicate_ids_keep_last() {
        let frame = Frame::new(
            0.0,
            vec![
                Node::audio_object(NodeId::new(1, 1), [0.0, 0.0, 0.0]),
                Node::audio_object(NodeId::new(2, 1), [0.0, 1.0, 0.0]),
                Node::audio_object(NodeId::new(1, 1), [1.0, 1.0, 1.0]),
            ],
        );

        assert_eq!(frame.nodes().len(), 2);
        let survivor = frame.nodes_by_group(1).next().unwrap();
        assert_eq!(survivor.cart(), Some(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_nodes_by_kind() {
        let frame = Frame::new(
            0.0,
            vec![
                Node::audio_object(NodeId::new(1, 1), [0.0, 1.0, 0.0]),
                Node::lfe(NodeId::new(2, 1)),
                Node::audio_object(NodeId::new(3, 1), [1.0, 0.0, 0.0]),
            ],
        );

        assert_eq!(frame.nodes_by_kind(NodeKind::AudioObject).count(), 2);
        assert_eq!(frame.nodes_by_kind(NodeKind::Lfe).count(), 1);
        assert_eq!(frame.nodes_by_kind(NodeKind::AgentState).count(), 0);
    }

    #[test]
    fn test_nodes_by_group() {
        let frame = Frame::new(
            1.0,
            vec![
                Node::audio_object(NodeId::new(1, 1), [0.0, 1.0, 0.0]),
                Node::SpectralFeatures {
                    id: NodeId::new(1, 2),
                    data: Default::default(),
                },
                Node::audio_object(NodeId::new(2, 1), [1.0, 0.0, 0.0]),
            ],
        );

        assert_eq!(frame.nodes_by_group(1).count(), 2);
        assert_eq!(frame.nodes_by_group(2).count(), 1);
        assert_eq!(frame.nodes_by_group(9).count(), 0);
    }
}
