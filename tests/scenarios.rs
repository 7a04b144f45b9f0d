use cdp_solver::exact::formulation::Formulation;
use cdp_solver::exact::model::LinearProgram;
use cdp_solver::exact::{ExactSolver, MipBackend, SolverOutcome};
use cdp_solver::heuristics::construction::{ConstructionHeuristic, GreedyConstruction, MultiStartConstruction};
use cdp_solver::{CdpError, Instance, Snapshot, VisitGraph};

const SPLIT: &str = "\
MaxTimeLag 50
k0 15 5
c0 20 0 100
s0
Locations
v0 0 0
v1 0 0
s0 3 0
c0 6 4
";

const LATE_WINDOW: &str = "\
MaxTimeLag 50
k0 15 5
c0 10 0 5
s0
Locations
v0 0 0
v1 0 0
s0 3 0
c0 6 4
";

const BAD_WINDOW: &str = "\
MaxTimeLag 50
k0 15 5
c0 10 60 40
s0
Locations
v0 0 0
v1 0 0
s0 3 0
c0 6 4
";

#[test]
fn split_customer_is_served_in_two_visits() {
    let instance = Instance::parse_str(SPLIT, "split").unwrap();
    let graph = VisitGraph::build(&instance);
    assert_eq!(instance.slot_count(0), 2);
    assert_eq!(graph.len(), 5);

    let plan = GreedyConstruction::new().construct(&instance);
    assert_eq!(plan.total_served, 20);
    assert_eq!(plan.served, vec!["c0".to_string()]);

    let formulation = Formulation::build(&instance, &graph);
    let values = formulation.encode(&instance, &graph, &plan);
    let violations = formulation.program().violations(&values, 1e-6);
    assert!(violations.is_empty(), "{:?}", violations);
    assert_eq!(formulation.program().evaluate_objective(&values), 20.0);
}

#[test]
fn unbounded_lag_still_serves_split_customer() {
    let text = SPLIT.replace("MaxTimeLag 50", &format!("MaxTimeLag {}", i32::MAX));
    let instance = Instance::parse_str(&text, "split").unwrap();

    let plan = GreedyConstruction::new().construct(&instance);
    assert_eq!(plan.total_served, 20);
    let plan = MultiStartConstruction::with_random_starts(3).construct(&instance);
    assert_eq!(plan.total_served, 20);
}

#[test]
fn closed_window_masks_every_time() {
    let instance = Instance::parse_str(LATE_WINDOW, "late").unwrap();
    let start = Snapshot::new(&instance);
    for t in 0..=120 {
        assert!(start.masked(0, t), "time {} should be masked", t);
        assert!(start.extend(0, t).is_none());
    }
    assert!(start.candidates().is_empty());

    let plan = MultiStartConstruction::with_random_starts(3).construct(&instance);
    assert_eq!(plan.total_served, 0);
}

#[test]
fn inverted_window_is_a_parse_error() {
    match Instance::parse_str(BAD_WINDOW, "bad") {
        Err(CdpError::Parse { line, .. }) => assert_eq!(line, Some(3)),
        other => panic!("expected parse error, got {:?}", other.map(|i| i.name().to_string())),
    }
}

/// Claims an optimum from the warm start it receives
struct EchoBackend;

impl MipBackend for EchoBackend {
    fn solve(&self, program: &LinearProgram, warm_start: Option<&[f64]>) -> cdp_solver::Result<SolverOutcome> {
        let values = warm_start.map(<[f64]>::to_vec).unwrap_or_else(|| vec![0.0; program.num_variables()]);
        if !program.violations(&values, 1e-6).is_empty() {
            return Ok(SolverOutcome::NoIncumbent { status: "Infeasible".to_string() });
        }
        let objective = program.evaluate_objective(&values);
        Ok(SolverOutcome::Feasible {
            values,
            objective,
            bound: objective,
            optimal: true,
            status: "Optimal".to_string(),
            nodes_explored: 1,
        })
    }

    fn name(&self) -> &str {
        "Echo"
    }
}

#[test]
fn exact_path_decodes_backend_assignment() {
    let instance = Instance::parse_str(SPLIT, "split").unwrap();
    let warm = GreedyConstruction::new().construct(&instance);
    let result = ExactSolver::new(EchoBackend).with_warm_start(warm).solve(&instance).unwrap();

    assert_eq!(result.status, "Optimal");
    assert_eq!(result.plan.total_served, 20);
    assert_eq!(result.plan.routes[0].nodes, vec![0, 1, 2, 4]);
}

#[test]
fn exact_path_without_incumbent_fails() {
    let instance = Instance::parse_str(SPLIT, "split").unwrap();
    // All-zero assignment breaks the depart/arrive constraints
    let err = ExactSolver::new(EchoBackend).solve(&instance).unwrap_err();
    assert!(matches!(err, CdpError::NoSolutionFound { ref status } if status == "Infeasible"));
}
