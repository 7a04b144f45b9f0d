//! Exact solving through an external MIP engine.
//!
//! The formulation is built once as a solver-agnostic [`LinearProgram`];
//! a [`MipBackend`] solves it and the assignment is decoded back into a
//! [`RoutePlan`].

pub mod formulation;
pub mod model;

use crate::error::{CdpError, Result};
use crate::graph::VisitGraph;
use crate::instance::Instance;
use crate::solution::RoutePlan;
use formulation::{Formulation, DEFAULT_BIG_M};
use model::LinearProgram;

// When built with the `gurobi` feature, expose the real backend
#[cfg(feature = "gurobi")]
mod gurobi;
#[cfg(feature = "gurobi")]
pub use gurobi::*;

// Otherwise a backend that reports the missing engine
#[cfg(not(feature = "gurobi"))]
mod gurobi_stub {
    use super::{GurobiConfig, MipBackend, SolverOutcome};
    use crate::error::{CdpError, Result};
    use crate::exact::model::LinearProgram;

    pub struct GurobiBackend {
        pub config: GurobiConfig,
    }

    impl GurobiBackend {
        pub fn new(config: GurobiConfig) -> Self {
            GurobiBackend { config }
        }
    }

    impl MipBackend for GurobiBackend {
        fn solve(&self, _program: &LinearProgram, _warm_start: Option<&[f64]>) -> Result<SolverOutcome> {
            Err(CdpError::Solver("Gurobi feature not enabled in this build".to_string()))
        }

        fn name(&self) -> &str {
            "Gurobi"
        }
    }
}

#[cfg(not(feature = "gurobi"))]
pub use gurobi_stub::*;

/// Gurobi solver configuration
#[derive(Debug, Clone)]
pub struct GurobiConfig {
    /// Time limit in seconds
    pub time_limit: f64,
    /// MIP gap tolerance
    pub mip_gap: f64,
    /// Number of threads (0 = automatic)
    pub threads: i32,
    /// Enable verbose output
    pub verbose: bool,
    /// Where to write the irreducible infeasible subsystem when the model is infeasible
    pub iis_path: Option<String>,
}

impl Default for GurobiConfig {
    fn default() -> Self {
        GurobiConfig {
            time_limit: 3600.0,
            mip_gap: 1e-6,
            threads: 0,
            verbose: false,
            iis_path: None,
        }
    }
}

/// What a backend returns for a program
#[derive(Debug, Clone)]
pub enum SolverOutcome {
    /// An incumbent exists, optimal or not
    Feasible {
        values: Vec<f64>,
        objective: f64,
        bound: f64,
        optimal: bool,
        status: String,
        nodes_explored: i64,
    },
    /// Infeasible, or a limit expired before any incumbent
    NoIncumbent { status: String },
}

/// A MIP engine able to solve a [`LinearProgram`]
pub trait MipBackend {
    /// `warm_start` holds one value per program variable
    fn solve(&self, program: &LinearProgram, warm_start: Option<&[f64]>) -> Result<SolverOutcome>;
    fn name(&self) -> &str;
}

/// Result of exact solving
#[derive(Debug, Clone)]
pub struct ExactResult {
    /// Best plan found
    pub plan: RoutePlan,
    /// Incumbent objective (served demand)
    pub objective: f64,
    /// Best bound proven by the engine
    pub bound: f64,
    /// Optimality gap
    pub gap: f64,
    /// Whether optimal solution was proven
    pub optimal: bool,
    /// Solver status
    pub status: String,
    /// Number of nodes explored
    pub nodes_explored: i64,
}

/// Builds the formulation of an instance and hands it to a backend
pub struct ExactSolver<B: MipBackend> {
    backend: B,
    big_m: f64,
    warm_start: Option<RoutePlan>,
}

impl<B: MipBackend> ExactSolver<B> {
    pub fn new(backend: B) -> Self {
        ExactSolver { backend, big_m: DEFAULT_BIG_M, warm_start: None }
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    /// Start the search from a known plan of the same instance
    pub fn with_warm_start(mut self, plan: RoutePlan) -> Self {
        self.warm_start = Some(plan);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn solve(&self, instance: &Instance) -> Result<ExactResult> {
        let start = std::time::Instant::now();
        let graph = VisitGraph::build(instance);
        let formulation = Formulation::with_big_m(instance, &graph, self.big_m);
        log::info!(
            "Solving {} with {}: {} variables, {} constraints",
            instance.name(),
            self.backend.name(),
            formulation.program().num_variables(),
            formulation.program().num_constraints()
        );

        let warm = self.warm_start.as_ref().map(|plan| formulation.encode(instance, &graph, plan));
        if let Some(values) = &warm {
            let violations = formulation.program().violations(values, 1e-6);
            if !violations.is_empty() {
                log::warn!("Warm start violates {} constraints, first: {}", violations.len(), violations[0]);
            }
        }

        match self.backend.solve(formulation.program(), warm.as_deref())? {
            SolverOutcome::Feasible { values, objective, bound, optimal, status, nodes_explored } => {
                if values.len() != formulation.program().num_variables() {
                    return Err(CdpError::Solver(format!(
                        "{} returned {} values for {} variables",
                        self.backend.name(),
                        values.len(),
                        formulation.program().num_variables()
                    )));
                }
                let algorithm = format!("{}-Exact", self.backend.name());
                let mut plan = formulation.decode(instance, &graph, &values, &algorithm);
                plan.computation_time = start.elapsed().as_secs_f64();
                let gap = if optimal { 0.0 } else { (bound - objective).abs() / objective.abs().max(1e-10) };
                log::info!("{}: status {}, objective {}, bound {}", algorithm, status, objective, bound);
                Ok(ExactResult { plan, objective, bound, gap, optimal, status, nodes_explored })
            }
            SolverOutcome::NoIncumbent { status } => {
                log::warn!("{} found no solution for {} ({})", self.backend.name(), instance.name(), status);
                Err(CdpError::NoSolutionFound { status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::heuristics::construction::{ConstructionHeuristic, GreedyConstruction};

    /// Returns the warm start as its incumbent
    struct Replay;

    impl MipBackend for Replay {
        fn solve(&self, program: &LinearProgram, warm_start: Option<&[f64]>) -> Result<SolverOutcome> {
            match warm_start {
                Some(values) => Ok(SolverOutcome::Feasible {
                    values: values.to_vec(),
                    objective: program.evaluate_objective(values),
                    bound: program.evaluate_objective(values),
                    optimal: true,
                    status: "Optimal".to_string(),
                    nodes_explored: 0,
                }),
                None => Ok(SolverOutcome::NoIncumbent { status: "TimeLimit".to_string() }),
            }
        }

        fn name(&self) -> &str {
            "Replay"
        }
    }

    #[test]
    fn test_warm_start_round_trip() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let greedy = GreedyConstruction::new().construct(&instance);
        let result = ExactSolver::new(Replay).with_warm_start(greedy.clone()).solve(&instance).unwrap();

        assert!(result.optimal);
        assert_eq!(result.objective, 20.0);
        assert_eq!(result.gap, 0.0);
        assert_eq!(result.plan.total_served, 20);
        assert_eq!(result.plan.routes[0].nodes, greedy.routes[0].nodes);
        assert_eq!(result.plan.algorithm, "Replay-Exact");
    }

    #[test]
    fn test_no_incumbent_is_no_solution() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        match ExactSolver::new(Replay).solve(&instance) {
            Err(CdpError::NoSolutionFound { status }) => assert_eq!(status, "TimeLimit"),
            other => panic!("unexpected {:?}", other.map(|r| r.status)),
        }
    }

    #[cfg(not(feature = "gurobi"))]
    #[test]
    fn test_stub_backend_reports_missing_engine() {
        let instance = Instance::parse_str(fixtures::SPLIT, "split").unwrap();
        let solver = ExactSolver::new(GurobiBackend::new(GurobiConfig::default()));
        assert!(matches!(solver.solve(&instance), Err(CdpError::Solver(_))));
    }
}
