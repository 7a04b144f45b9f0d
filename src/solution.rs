//! Route plans: the common output of the exact and constructive paths.
//!
//! A plan is expressed over the visit graph: which vehicle runs which chain
//! of nodes from the start depot to the end depot, when each node is
//! completed, and which customers received their full demand.

use crate::graph::VisitGraph;
use crate::heuristics::state::Snapshot;
use crate::instance::Instance;
use serde::{Deserialize, Serialize};

/// The chain of visit nodes a vehicle runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRoute {
    pub vehicle: usize,
    pub vehicle_id: String,
    /// Visit-graph node indices, start depot first and end depot last
    pub nodes: Vec<usize>,
}

/// Completion time of a visit node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTime {
    pub node: usize,
    pub label: String,
    /// Index into the instance location table
    pub location: usize,
    /// Customer served at this node, for visit slots
    pub customer: Option<usize>,
    /// `None` when no vehicle reaches the node
    pub completion: Option<i32>,
}

/// Represents a solution to the routing problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    pub instance: String,
    /// Algorithm that generated this plan
    pub algorithm: String,
    /// Identifiers of the customers whose whole demand is delivered
    pub served: Vec<String>,
    pub routes: Vec<VehicleRoute>,
    pub completion_times: Vec<NodeTime>,
    /// Objective value: total demand of served customers
    pub total_served: i32,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl RoutePlan {
    /// Map the deliveries of a snapshot onto visit-graph slots.
    ///
    /// The `n`-th delivery to a customer fills its `n`-th slot. Every chain
    /// ends at the end depot, whose completion is the latest return over the
    /// fleet, service of the last stop included.
    pub fn from_snapshot(instance: &Instance, graph: &VisitGraph, snapshot: &Snapshot<'_>, algorithm: &str) -> Self {
        let mut completion: Vec<Option<i32>> = vec![None; graph.len()];
        let mut filled = vec![0usize; instance.customers().len()];
        let mut chains: Vec<Vec<usize>> = vec![vec![graph.start()]; instance.vehicles().len()];

        for action in snapshot.actions() {
            let slots = graph.slots_of(action.customer);
            let node = slots.start + filled[action.customer];
            filled[action.customer] += 1;
            debug_assert!(node < slots.end, "more deliveries than slots");
            completion[node] = Some(action.departure);
            chains[action.vehicle].push(node);
        }

        let mut finish = 0;
        for (k, chain) in chains.iter_mut().enumerate() {
            let last = chain.last().copied().unwrap_or(graph.start());
            let left = completion[last].unwrap_or(0);
            finish = finish.max(left.saturating_add(Self::return_leg(instance, graph, k, last)));
            chain.push(graph.end());
        }
        completion[graph.start()] = Some(0);
        completion[graph.end()] = Some(finish);

        let served = instance
            .customers()
            .iter()
            .zip(snapshot.customers())
            .filter(|(_, state)| state.pending <= 0)
            .map(|(c, _)| c.id.clone())
            .collect();

        Self::assemble(instance, graph, algorithm, served, chains, completion, snapshot.fitness())
    }

    pub(crate) fn assemble(
        instance: &Instance,
        graph: &VisitGraph,
        algorithm: &str,
        served: Vec<String>,
        chains: Vec<Vec<usize>>,
        completion: Vec<Option<i32>>,
        total_served: i32,
    ) -> Self {
        let routes = chains
            .into_iter()
            .enumerate()
            .map(|(k, nodes)| VehicleRoute {
                vehicle: k,
                vehicle_id: instance.vehicles()[k].id.clone(),
                nodes,
            })
            .collect();

        let completion_times = completion
            .into_iter()
            .enumerate()
            .map(|(node, completion)| NodeTime {
                node,
                label: graph.label(instance, node),
                location: graph.node(node).location,
                customer: graph.customer_of(node),
                completion,
            })
            .collect();

        RoutePlan {
            instance: instance.name().to_string(),
            algorithm: algorithm.to_string(),
            served,
            routes,
            completion_times,
            total_served,
            computation_time: 0.0,
        }
    }

    /// Time charged between completing `last` and reaching the end depot.
    ///
    /// Service is due on every leg except one leaving the start depot, the
    /// same rule the time-propagation constraints apply.
    pub(crate) fn return_leg(instance: &Instance, graph: &VisitGraph, vehicle: usize, last: usize) -> i32 {
        let service = if last == graph.start() { 0 } else { instance.vehicles()[vehicle].service_length };
        service.saturating_add(instance.distance(graph.node(last).location, graph.node(graph.end()).location))
    }

    /// Traversed arcs as `(vehicle, from, to)` node triples
    pub fn arcs(&self) -> Vec<(usize, usize, usize)> {
        self.routes
            .iter()
            .flat_map(|r| r.nodes.windows(2).map(move |w| (r.vehicle, w[0], w[1])))
            .collect()
    }

    pub fn is_served(&self, customer_id: &str) -> bool {
        self.served.iter().any(|c| c == customer_id)
    }

    pub fn completion(&self, node: usize) -> Option<i32> {
        self.completion_times.get(node).and_then(|t| t.completion)
    }

    /// Sum of node completion times, a secondary quality measure
    pub fn total_completion(&self) -> i64 {
        self.completion_times.iter().filter_map(|t| t.completion).map(i64::from).sum()
    }

    fn label(&self, node: usize) -> &str {
        self.completion_times.get(node).map(|t| t.label.as_str()).unwrap_or("?")
    }
}

impl std::fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Route plan ({}) for {}", self.algorithm, self.instance)?;
        writeln!(f, "  Total served demand: {}", self.total_served)?;
        writeln!(f, "  Served customers: {}", if self.served.is_empty() { "-".to_string() } else { self.served.join(", ") })?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        for route in &self.routes {
            let path: Vec<&str> = route.nodes.iter().map(|&n| self.label(n)).collect();
            writeln!(f, "  Vehicle {}: {}", route.vehicle_id, path.join(" -> "))?;
        }
        for (k, from, to) in self.arcs() {
            writeln!(f, "    x[{}][{}][{}] = 1", from, to, k)?;
        }
        writeln!(f, "  Completion times:")?;
        for t in &self.completion_times {
            match t.completion {
                Some(c) => writeln!(f, "    C[{}] ({}) = {}", t.node, t.label, c)?,
                None => writeln!(f, "    C[{}] ({}) = -", t.node, t.label)?,
            }
        }
        Ok(())
    }
}
