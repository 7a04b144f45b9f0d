//! Mixed-integer formulation of the relay routing problem.
//!
//! Variables:
//! - `y_c`: customer `c` receives its whole demand
//! - `x_i_j_k`: vehicle `k` travels from node `i` to node `j` of the visit graph
//! - `C_i`: completion time at node `i`
//!
//! The objective maximizes the served demand. Travel times between nodes are
//! the station-routed distances of the instance, and every leg adds the
//! service time of the vehicle except legs leaving the start depot.

use crate::exact::model::{ConstraintSense, LinearExpr, LinearProgram, ObjectiveSense, VarId};
use crate::graph::VisitGraph;
use crate::instance::Instance;
use crate::solution::RoutePlan;
use std::collections::HashMap;

pub const DEFAULT_BIG_M: f64 = 1_000_000.0;

/// Values above this count as 1 for binaries
const ACTIVE: f64 = 0.5;

pub struct Formulation {
    program: LinearProgram,
    served: Vec<VarId>,
    arcs: HashMap<(usize, usize, usize), VarId>,
    completion: Vec<VarId>,
    big_m: f64,
}

impl Formulation {
    pub fn build(instance: &Instance, graph: &VisitGraph) -> Self {
        Self::with_big_m(instance, graph, DEFAULT_BIG_M)
    }

    pub fn with_big_m(instance: &Instance, graph: &VisitGraph, big_m: f64) -> Self {
        let mut program = LinearProgram::new(instance.name());
        let n = graph.len();
        let vehicles = instance.vehicles();
        let customers = instance.customers();

        let served: Vec<VarId> = (0..customers.len()).map(|c| program.add_binary(format!("y_{}", c))).collect();

        let mut arcs = HashMap::new();
        for i in 0..n {
            for j in 0..n {
                if !is_arc(graph, i, j) {
                    continue;
                }
                for k in 0..vehicles.len() {
                    arcs.insert((i, j, k), program.add_binary(format!("x_{}_{}_{}", i, j, k)));
                }
            }
        }

        let completion: Vec<VarId> = (0..n)
            .map(|i| match graph.customer_of(i) {
                Some(c) => program.add_integer(
                    format!("C_{}", i),
                    customers[c].earliest as f64,
                    customers[c].latest as f64,
                ),
                None => program.add_integer(format!("C_{}", i), 0.0, f64::INFINITY),
            })
            .collect();

        let mut formulation = Formulation { program, served, arcs, completion, big_m };
        formulation.add_routing(instance, graph);
        formulation.add_coverage(instance, graph);
        formulation.add_timing(instance, graph);

        let objective = customers
            .iter()
            .zip(&formulation.served)
            .fold(LinearExpr::new(), |e, (c, &y)| e.plus(y, c.demand as f64));
        formulation.program.set_objective(objective, ObjectiveSense::Maximize);

        log::debug!(
            "Formulation for {}: {} variables, {} constraints",
            instance.name(),
            formulation.program.num_variables(),
            formulation.program.num_constraints()
        );
        formulation
    }

    fn x(&self, i: usize, j: usize, k: usize) -> Option<VarId> {
        self.arcs.get(&(i, j, k)).copied()
    }

    fn outgoing(&self, graph: &VisitGraph, i: usize, k: usize) -> Vec<VarId> {
        (0..graph.len()).filter_map(|j| self.x(i, j, k)).collect()
    }

    fn incoming(&self, graph: &VisitGraph, j: usize, k: usize) -> Vec<VarId> {
        (0..graph.len()).filter_map(|i| self.x(i, j, k)).collect()
    }

    /// `Σ_k coeff_k · Σ_j x_i_j_k`
    fn weighted_out(&self, graph: &VisitGraph, i: usize, coeff: impl Fn(usize) -> f64, vehicles: usize) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for k in 0..vehicles {
            for v in self.outgoing(graph, i, k) {
                expr.add_term(v, coeff(k));
            }
        }
        expr
    }

    fn weighted_in(&self, graph: &VisitGraph, j: usize, coeff: impl Fn(usize) -> f64, vehicles: usize) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for k in 0..vehicles {
            for v in self.incoming(graph, j, k) {
                expr.add_term(v, coeff(k));
            }
        }
        expr
    }

    fn add_routing(&mut self, instance: &Instance, graph: &VisitGraph) {
        let num_vehicles = instance.vehicles().len();
        let one = || LinearExpr::constant(1.0);

        for k in 0..num_vehicles {
            let depart = LinearExpr::sum(self.outgoing(graph, graph.start(), k), 1.0);
            self.program.add_constraint(format!("depart_{}", k), depart, ConstraintSense::Equal, one());
            let arrive = LinearExpr::sum(self.incoming(graph, graph.end(), k), 1.0);
            self.program.add_constraint(format!("arrive_{}", k), arrive, ConstraintSense::Equal, one());
        }

        for i in (0..graph.len()).filter(|&i| graph.is_interior(i)) {
            for k in 0..num_vehicles {
                let inflow = LinearExpr::sum(self.incoming(graph, i, k), 1.0);
                let outflow = LinearExpr::sum(self.outgoing(graph, i, k), 1.0);
                self.program.add_constraint(format!("flow_{}_{}", i, k), inflow, ConstraintSense::Equal, outflow);
            }
            let visits = self.weighted_out(graph, i, |_| 1.0, num_vehicles);
            self.program.add_constraint(format!("single_visit_{}", i), visits, ConstraintSense::LessEqual, one());
        }

        for (i, next) in graph.consecutive_slots().collect::<Vec<_>>() {
            let later = self.weighted_out(graph, next, |_| 1.0, num_vehicles);
            let earlier = self.weighted_out(graph, i, |_| 1.0, num_vehicles);
            self.program.add_constraint(format!("slot_order_{}", i), later, ConstraintSense::LessEqual, earlier);
        }
    }

    fn add_coverage(&mut self, instance: &Instance, graph: &VisitGraph) {
        let vehicles = instance.vehicles();
        for (c, customer) in instance.customers().iter().enumerate() {
            let mut delivered = LinearExpr::new();
            for slot in graph.slots_of(c) {
                for (k, vehicle) in vehicles.iter().enumerate() {
                    for v in self.outgoing(graph, slot, k) {
                        delivered.add_term(v, vehicle.capacity as f64);
                    }
                }
            }
            let required = LinearExpr::new().plus(self.served[c], customer.demand as f64);
            self.program.add_constraint(format!("cover_{}", c), delivered, ConstraintSense::GreaterEqual, required);
        }
    }

    fn add_timing(&mut self, instance: &Instance, graph: &VisitGraph) {
        let vehicles = instance.vehicles();
        let service = |k: usize| vehicles[k].service_length as f64;
        let m = self.big_m;
        let start = graph.start();

        // C_i - M(1 - x) <= C_j - service - dist, written as C_i - C_j + M x <= M - service - dist
        let arcs: Vec<(usize, usize, usize, VarId)> = {
            let mut arcs: Vec<_> = self.arcs.iter().map(|(&(i, j, k), &v)| (i, j, k, v)).collect();
            arcs.sort_unstable_by_key(|&(i, j, k, _)| (i != start, i, j, k));
            arcs
        };
        for (i, j, k, x) in arcs {
            let dist = instance.distance(graph.node(i).location, graph.node(j).location) as f64;
            let (name, leg) = if i == start {
                (format!("time_start_{}_{}", j, k), dist)
            } else {
                (format!("time_{}_{}_{}", i, j, k), service(k) + dist)
            };
            let lhs = LinearExpr::var(self.completion[i]).plus(self.completion[j], -1.0).plus(x, m);
            self.program.add_constraint(name, lhs, ConstraintSense::LessEqual, LinearExpr::constant(m - leg));
        }

        let num_vehicles = vehicles.len();
        for c in 0..instance.customers().len() {
            let earliest = instance.customers()[c].earliest as f64;
            for i in graph.slots_of(c) {
                let lhs = LinearExpr::var(self.completion[i]) - self.weighted_out(graph, i, service, num_vehicles);
                self.program.add_constraint(
                    format!("window_{}", i),
                    lhs,
                    ConstraintSense::GreaterEqual,
                    LinearExpr::constant(earliest),
                );
            }
        }

        let max_lag = instance.max_lag() as f64;
        for (i, next) in graph.consecutive_slots().collect::<Vec<_>>() {
            let gap = LinearExpr::var(self.completion[next])
                - self.weighted_in(graph, next, service, num_vehicles)
                - LinearExpr::var(self.completion[i]);
            self.program.add_constraint(
                format!("lag_{}", i),
                gap.clone(),
                ConstraintSense::LessEqual,
                LinearExpr::constant(max_lag),
            );
            self.program.add_constraint(format!("overlap_{}", i), gap, ConstraintSense::GreaterEqual, LinearExpr::new());
        }
    }

    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    pub fn into_program(self) -> LinearProgram {
        self.program
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    pub fn served_var(&self, customer: usize) -> VarId {
        self.served[customer]
    }

    pub fn arc_var(&self, from: usize, to: usize, vehicle: usize) -> Option<VarId> {
        self.x(from, to, vehicle)
    }

    pub fn completion_var(&self, node: usize) -> VarId {
        self.completion[node]
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Rebuild a route plan from a solver assignment
    pub fn decode(&self, instance: &Instance, graph: &VisitGraph, values: &[f64], algorithm: &str) -> RoutePlan {
        let active = |v: VarId| values.get(v.0).map_or(false, |&x| x > ACTIVE);
        let n = graph.len();

        let mut chains = Vec::with_capacity(instance.vehicles().len());
        let mut reached = vec![false; n];
        reached[graph.start()] = true;

        for k in 0..instance.vehicles().len() {
            let mut chain = vec![graph.start()];
            let mut current = graph.start();
            while current != graph.end() {
                let next = (0..n).find(|&j| !chain.contains(&j) && self.x(current, j, k).map_or(false, active));
                match next {
                    Some(j) => {
                        chain.push(j);
                        reached[j] = true;
                        current = j;
                    }
                    None => {
                        log::warn!("Route of vehicle {} stops at node {}", instance.vehicles()[k].id, current);
                        break;
                    }
                }
            }
            chains.push(chain);
        }

        let completion = (0..n)
            .map(|i| reached[i].then(|| values.get(self.completion[i].0).map_or(0, |v| v.round() as i32)))
            .collect();

        let mut served = Vec::new();
        let mut total = 0;
        for (c, customer) in instance.customers().iter().enumerate() {
            if active(self.served[c]) {
                served.push(customer.id.clone());
                total += customer.demand;
            }
        }

        RoutePlan::assemble(instance, graph, algorithm, served, chains, completion, total)
    }

    /// Assignment equivalent to a route plan, usable as a warm start.
    ///
    /// Unvisited slots take the completion time of the previous slot of their
    /// customer (the window start for a first slot), unvisited stations 0, and
    /// the end depot the latest return over the fleet.
    pub fn encode(&self, instance: &Instance, graph: &VisitGraph, plan: &RoutePlan) -> Vec<f64> {
        let mut values = vec![0.0; self.program.num_variables()];

        for (c, customer) in instance.customers().iter().enumerate() {
            if plan.is_served(&customer.id) {
                values[self.served[c].0] = 1.0;
            }
        }

        for (k, from, to) in plan.arcs() {
            match self.x(from, to, k) {
                Some(v) => values[v.0] = 1.0,
                None => log::warn!("Plan uses arc {} -> {} that the formulation does not have", from, to),
            }
        }

        let end = graph.end();
        for i in 0..graph.len() {
            if i == end {
                continue;
            }
            let time = match (plan.completion(i), graph.customer_of(i)) {
                (Some(t), _) => t as f64,
                (None, Some(c)) if i > graph.slots_of(c).start => values[self.completion[i - 1].0],
                (None, Some(c)) => instance.customers()[c].earliest as f64,
                (None, None) => 0.0,
            };
            values[self.completion[i].0] = time;
        }

        let finish = plan
            .arcs()
            .into_iter()
            .filter(|&(_, _, to)| to == end)
            .map(|(k, from, _)| values[self.completion[from].0] + RoutePlan::return_leg(instance, graph, k, from) as f64)
            .fold(0.0, f64::max);
        values[self.completion[end].0] = finish;

        values
    }
}

fn is_arc(graph: &VisitGraph, from: usize, to: usize) -> bool {
    from != to && from != graph.end() && to != graph.start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::heuristics::state::Snapshot;

    fn split() -> (Instance, VisitGraph) {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let graph = VisitGraph::build(&instance);
        (instance, graph)
    }

    #[test]
    fn test_variable_and_constraint_counts() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        // 13 arcs, 1 customer, 5 nodes
        assert_eq!(f.num_arcs(), 13);
        assert_eq!(f.program().num_variables(), 19);
        assert_eq!(f.program().num_constraints(), 27);
        assert_eq!(f.big_m(), DEFAULT_BIG_M);
    }

    #[test]
    fn test_arc_set_excludes_depot_reversals_and_loops() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        for i in 0..graph.len() {
            assert!(f.arc_var(i, graph.start(), 0).is_none());
            assert!(f.arc_var(graph.end(), i, 0).is_none());
            assert!(f.arc_var(i, i, 0).is_none());
        }
        assert!(f.arc_var(graph.start(), graph.end(), 0).is_some());
    }

    #[test]
    fn test_constraint_names_and_coefficients() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let lp = f.program();
        for name in ["depart_0", "arrive_0", "flow_1_0", "single_visit_3", "slot_order_1", "cover_0", "time_1_2_0", "time_start_1_0", "window_2", "lag_1", "overlap_1"] {
            assert!(lp.constraint(name).is_some(), "missing {}", name);
        }

        // c0 -> c0 goes through s0 twice: 10, plus 5 service
        assert_eq!(lp.constraint("time_1_2_0").unwrap().rhs, DEFAULT_BIG_M - 15.0);
        assert_eq!(lp.constraint("time_start_1_0").unwrap().rhs, DEFAULT_BIG_M - 8.0);
        assert_eq!(lp.constraint("lag_1").unwrap().rhs, 50.0);

        let c1 = lp.var_by_name("C_1").unwrap();
        assert_eq!(lp.variables()[c1.0].upper, 100.0);
    }

    #[test]
    fn test_encoded_snapshot_plan_is_feasible() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let done = Snapshot::new(&instance).extend(0, 8).unwrap().extend(0, 23).unwrap().close();
        let plan = RoutePlan::from_snapshot(&instance, &graph, &done, "greedy");

        let values = f.encode(&instance, &graph, &plan);
        let violations = f.program().violations(&values, 1e-6);
        assert!(violations.is_empty(), "{:?}", violations);
        assert_eq!(f.program().evaluate_objective(&values), 20.0);
        assert_eq!(values[f.completion_var(4).0], 41.0);
    }

    #[test]
    fn test_partial_plan_encodes_feasibly() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let done = Snapshot::new(&instance).extend(0, 8).unwrap().close();
        let plan = RoutePlan::from_snapshot(&instance, &graph, &done, "greedy");

        let values = f.encode(&instance, &graph, &plan);
        assert!(f.program().violations(&values, 1e-6).is_empty());
        assert_eq!(f.program().evaluate_objective(&values), 0.0);
        // Second slot copies the first
        assert_eq!(values[f.completion_var(2).0], 13.0);
    }

    #[test]
    fn test_claiming_unserved_demand_is_rejected() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let done = Snapshot::new(&instance).extend(0, 8).unwrap().close();
        let plan = RoutePlan::from_snapshot(&instance, &graph, &done, "greedy");

        let mut values = f.encode(&instance, &graph, &plan);
        values[f.served_var(0).0] = 1.0;
        let names: Vec<String> = f.program().violations(&values, 1e-6).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["cover_0"]);
    }

    #[test]
    fn test_timing_rows_reject_bad_completions() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let done = Snapshot::new(&instance).extend(0, 8).unwrap().extend(0, 23).unwrap().close();
        let plan = RoutePlan::from_snapshot(&instance, &graph, &done, "greedy");
        let encoded = f.encode(&instance, &graph, &plan);
        let rejected = |values: &[f64]| -> Vec<String> {
            f.program().violations(values, 1e-6).into_iter().map(|v| v.name).collect()
        };

        // Second delivery starts 51 after the first one ends
        let mut late = encoded.clone();
        late[f.completion_var(2).0] = 69.0;
        late[f.completion_var(4).0] = 82.0;
        assert_eq!(rejected(&late), vec!["lag_1"]);

        // Second delivery starts before the first one ends
        let mut early = encoded.clone();
        early[f.completion_var(2).0] = 17.0;
        assert_eq!(rejected(&early), vec!["time_1_2_0", "overlap_1"]);

        // First delivery would start before the window opens
        let mut before = encoded;
        before[f.completion_var(1).0] = 4.0;
        assert_eq!(rejected(&before), vec!["time_start_1_0", "window_1"]);
    }

    #[test]
    fn test_decode_round_trips_plan() {
        let (instance, graph) = split();
        let f = Formulation::build(&instance, &graph);
        let done = Snapshot::new(&instance).extend(0, 8).unwrap().extend(0, 23).unwrap().close();
        let plan = RoutePlan::from_snapshot(&instance, &graph, &done, "greedy");

        let decoded = f.decode(&instance, &graph, &f.encode(&instance, &graph, &plan), "exact");
        assert_eq!(decoded.routes[0].nodes, plan.routes[0].nodes);
        assert_eq!(decoded.served, vec!["c0".to_string()]);
        assert_eq!(decoded.total_served, 20);
        assert_eq!(decoded.completion(2), Some(28));
        assert_eq!(decoded.completion(3), None);
        assert_eq!(decoded.completion(4), Some(41));
    }
}
