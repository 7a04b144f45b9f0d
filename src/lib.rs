//! Split-delivery vehicle routing through relay stations
//!
//! A heterogeneous fleet leaves a start depot, delivers to customers inside
//! their time windows, possibly in several partial visits separated by at
//! most a maximum lag, and returns to an end depot. All travel between
//! customers passes through a relay station. The goal is to maximize the
//! total demand of fully served customers.
//!
//! # Features
//!
//! - Instance loader with station-routed integer distances
//! - Visit graph with one slot per possible partial delivery
//! - Mixed-integer formulation, exportable in LP format and solvable with Gurobi
//! - Constructive engine over immutable snapshots, with greedy and multi-start drivers
//! - Batch runs and visualization tools
//!
//! # Example
//!
//! ```no_run
//! use cdp_solver::instance::Instance;
//! use cdp_solver::heuristics::construction::{ConstructionHeuristic, MultiStartConstruction};
//!
//! let instance = Instance::from_file("instance.rmc").unwrap();
//! let multi_start = MultiStartConstruction::with_all_heuristics();
//! let plan = multi_start.construct(&instance);
//!
//! println!("Served demand: {}", plan.total_served);
//! ```

pub mod error;
pub mod instance;
pub mod graph;
pub mod solution;
pub mod heuristics;
pub mod exact;
pub mod benchmark;
pub mod visualization;

#[cfg(test)]
mod fixtures;

pub use error::{CdpError, Result};
pub use graph::VisitGraph;
pub use heuristics::state::Snapshot;
pub use instance::Instance;
pub use solution::RoutePlan;
