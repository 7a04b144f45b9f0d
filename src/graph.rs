//! Expansion of customers into split-delivery visit slots.
//!
//! The visit graph is the node set shared by the MIP formulation and the
//! route plans: the start depot, then `ceil(demand / min_capacity)` slots per
//! customer (adjacent, in delivery order), then one waypoint per relay
//! station, then the end depot. Node indices are stable for a given instance.

use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What a node of the visit graph stands for
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    StartDepot,
    /// The `slot`-th partial delivery to `customer` (both 0-based)
    Slot { customer: usize, slot: usize },
    Station { station: usize },
    EndDepot,
}

/// A node of the visit graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitNode {
    pub kind: NodeKind,
    /// Index into the instance location table
    pub location: usize,
}

/// Ordered visit nodes of an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitGraph {
    nodes: Vec<VisitNode>,
    /// Slot range per customer
    slots: Vec<Range<usize>>,
}

impl VisitGraph {
    pub fn build(instance: &Instance) -> Self {
        let mut nodes = Vec::new();
        nodes.push(VisitNode { kind: NodeKind::StartDepot, location: instance.start_depot() });

        let mut slots = Vec::with_capacity(instance.customers().len());
        for (c, customer) in instance.customers().iter().enumerate() {
            let first = nodes.len();
            for slot in 0..instance.slot_count(c) {
                nodes.push(VisitNode {
                    kind: NodeKind::Slot { customer: c, slot },
                    location: customer.location,
                });
            }
            slots.push(first..nodes.len());
        }

        for (s, &location) in instance.stations().iter().enumerate() {
            nodes.push(VisitNode { kind: NodeKind::Station { station: s }, location });
        }

        nodes.push(VisitNode { kind: NodeKind::EndDepot, location: instance.end_depot() });

        log::debug!(
            "visit graph for {}: {} nodes ({} slots)",
            instance.name(),
            nodes.len(),
            slots.iter().map(|r| r.len()).sum::<usize>()
        );

        VisitGraph { nodes, slots }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[VisitNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &VisitNode {
        &self.nodes[index]
    }

    /// Index of the start depot node
    #[inline]
    pub fn start(&self) -> usize {
        0
    }

    /// Index of the end depot node
    #[inline]
    pub fn end(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Neither depot
    pub fn is_interior(&self, index: usize) -> bool {
        index != self.start() && index != self.end()
    }

    /// Node indices of the slots of a customer
    pub fn slots_of(&self, customer: usize) -> Range<usize> {
        self.slots[customer].clone()
    }

    /// Customer served at a node, if the node is a slot
    pub fn customer_of(&self, index: usize) -> Option<usize> {
        match self.nodes[index].kind {
            NodeKind::Slot { customer, .. } => Some(customer),
            _ => None,
        }
    }

    /// The following slot of the same customer
    pub fn next_slot(&self, index: usize) -> Option<usize> {
        let customer = self.customer_of(index)?;
        let next = index + 1;
        (next < self.slots[customer].end).then_some(next)
    }

    /// Pairs `(i, i + 1)` of consecutive slots of the same customer
    pub fn consecutive_slots(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nodes.len()).filter_map(move |i| self.next_slot(i).map(|j| (i, j)))
    }

    /// Human-readable node label such as `c3#1`
    pub fn label(&self, instance: &Instance, index: usize) -> String {
        let node = &self.nodes[index];
        let id = &instance.location(node.location).id;
        match node.kind {
            NodeKind::Slot { slot, .. } => format!("{}#{}", id, slot),
            _ => id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_node_layout() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let graph = VisitGraph::build(&instance);

        // 2 depots + (2 + 2 + 1) slots + 2 stations
        assert_eq!(graph.len(), 9);
        assert_eq!(graph.node(0).kind, NodeKind::StartDepot);
        assert_eq!(graph.node(1).kind, NodeKind::Slot { customer: 0, slot: 0 });
        assert_eq!(graph.node(2).kind, NodeKind::Slot { customer: 0, slot: 1 });
        assert_eq!(graph.node(3).kind, NodeKind::Slot { customer: 1, slot: 0 });
        assert_eq!(graph.node(5).kind, NodeKind::Slot { customer: 2, slot: 0 });
        assert_eq!(graph.node(6).kind, NodeKind::Station { station: 0 });
        assert_eq!(graph.node(7).kind, NodeKind::Station { station: 1 });
        assert_eq!(graph.node(8).kind, NodeKind::EndDepot);
        assert_eq!(graph.end(), 8);
    }

    #[test]
    fn test_slot_counts_match_formula() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let graph = VisitGraph::build(&instance);
        let mut total = 2 + instance.stations().len();
        for (c, customer) in instance.customers().iter().enumerate() {
            let expected = (customer.demand + instance.min_capacity() - 1) / instance.min_capacity();
            assert_eq!(graph.slots_of(c).len(), expected as usize);
            total += expected as usize;
        }
        assert_eq!(graph.len(), total);
    }

    #[test]
    fn test_consecutive_slots() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let graph = VisitGraph::build(&instance);
        let pairs: Vec<(usize, usize)> = graph.consecutive_slots().collect();
        assert_eq!(pairs, vec![(1, 2), (3, 4)]);
        assert_eq!(graph.next_slot(2), None);
        assert_eq!(graph.next_slot(6), None);
    }

    #[test]
    fn test_labels() {
        let instance = Instance::parse_str(fixtures::SAMPLE, "sample").unwrap();
        let graph = VisitGraph::build(&instance);
        assert_eq!(graph.label(&instance, 0), "v0");
        assert_eq!(graph.label(&instance, 2), "c0#1");
        assert_eq!(graph.label(&instance, 5), "c10#0");
        assert_eq!(graph.label(&instance, 6), "s0");
        assert_eq!(graph.label(&instance, 8), "v1");
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = VisitGraph::build(&Instance::parse_str(fixtures::SAMPLE, "a").unwrap());
        let b = VisitGraph::build(&Instance::parse_str(fixtures::SAMPLE, "b").unwrap());
        let kinds_a: Vec<NodeKind> = a.nodes().iter().map(|n| n.kind).collect();
        let kinds_b: Vec<NodeKind> = b.nodes().iter().map(|n| n.kind).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
