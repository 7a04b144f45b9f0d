use crate::graph::VisitGraph;
use crate::heuristics::state::Snapshot;
use crate::instance::Instance;
use crate::solution::RoutePlan;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &Instance) -> RoutePlan;
    fn name(&self) -> &str;
}

/// Which candidate action the greedy driver commits first
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SelectionRule {
    /// Smallest feasible start time
    EarliestStart,
    /// Customer whose window closes first
    TightestDeadline,
}

/// Greedy constructive search over engine snapshots
///
/// At each step the unmasked actions are ranked by the selection rule and
/// the best one that a vehicle can take is committed. The randomized variant
/// draws among the `top_k` best candidates instead. Runs until no action is
/// left, then sends the fleet back to the end depot.
pub struct GreedyConstruction {
    pub rule: SelectionRule,
    pub randomized: bool,
    pub seed: u64,
    pub top_k: usize,
    name: String,
}

impl GreedyConstruction {
    pub fn new() -> Self {
        Self::with_rule(SelectionRule::EarliestStart)
    }

    pub fn tightest_deadline() -> Self {
        Self::with_rule(SelectionRule::TightestDeadline)
    }

    pub fn with_rule(rule: SelectionRule) -> Self {
        GreedyConstruction {
            rule,
            randomized: false,
            seed: 42,
            top_k: 3,
            name: format!("Greedy-{:?}", rule),
        }
    }

    pub fn randomized(seed: u64) -> Self {
        GreedyConstruction {
            rule: SelectionRule::EarliestStart,
            randomized: true,
            seed,
            top_k: 3,
            name: format!("Greedy-Randomized-{}", seed),
        }
    }

    fn rank(&self, instance: &Instance, candidates: &mut [(usize, i32)]) {
        let latest = |c: usize| instance.customers()[c].latest;
        match self.rule {
            SelectionRule::EarliestStart => candidates.sort_by_key(|&(c, t)| (t, latest(c), c)),
            SelectionRule::TightestDeadline => candidates.sort_by_key(|&(c, t)| (latest(c), t, c)),
        }
    }

    /// Build the final snapshot
    pub fn run<'a>(&self, instance: &'a Instance) -> Snapshot<'a> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut state = Snapshot::new(instance);

        loop {
            let mut candidates = state.candidates();
            if candidates.is_empty() {
                break;
            }
            self.rank(instance, &mut candidates);

            let first = if self.randomized && candidates.len() > 1 {
                rng.gen_range(0..candidates.len().min(self.top_k))
            } else {
                0
            };

            let order = std::iter::once(first).chain((0..candidates.len()).filter(|&i| i != first));
            let mut next = None;
            for i in order {
                let (customer, time) = candidates[i];
                next = state.extend(customer, time);
                if next.is_some() {
                    break;
                }
            }

            match next {
                Some(s) => state = s,
                None => break,
            }
        }

        log::debug!("{}: {} actions, fitness {}", self.name, state.num_actions(), state.fitness());
        state.close()
    }
}

impl Default for GreedyConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GreedyConstruction {
    fn construct(&self, instance: &Instance) -> RoutePlan {
        let start = std::time::Instant::now();
        let graph = VisitGraph::build(instance);
        let snapshot = self.run(instance);
        let mut plan = RoutePlan::from_snapshot(instance, &graph, &snapshot, self.name());
        plan.computation_time = start.elapsed().as_secs_f64();
        plan
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Multi-Start Construction
///
/// Runs several construction heuristics in parallel and keeps the plan that
/// serves the most demand, then the one finishing earliest.
pub struct MultiStartConstruction {
    heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>>,
}

impl MultiStartConstruction {
    pub fn new() -> Self {
        MultiStartConstruction { heuristics: Vec::new() }
    }

    pub fn with_all_heuristics() -> Self {
        Self::with_random_starts(8)
    }

    /// Both deterministic rules plus `starts` randomized runs with seeds `1..=starts`
    pub fn with_random_starts(starts: u64) -> Self {
        let mut multi = Self::new();
        multi.add_heuristic(GreedyConstruction::new());
        multi.add_heuristic(GreedyConstruction::tightest_deadline());
        for seed in 1..=starts {
            multi.add_heuristic(GreedyConstruction::randomized(seed));
        }
        multi
    }

    pub fn add_heuristic<H: ConstructionHeuristic + Send + Sync + 'static>(&mut self, h: H) {
        self.heuristics.push(Box::new(h));
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }
}

impl Default for MultiStartConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for MultiStartConstruction {
    fn construct(&self, instance: &Instance) -> RoutePlan {
        let start = std::time::Instant::now();

        if self.heuristics.is_empty() {
            return GreedyConstruction::new().construct(instance);
        }

        let plans: Vec<RoutePlan> = self.heuristics.par_iter().map(|h| h.construct(instance)).collect();

        let mut best: Option<RoutePlan> = None;
        for plan in plans {
            log::debug!("{}: served {}", plan.algorithm, plan.total_served);
            let better = match &best {
                None => true,
                Some(b) => {
                    plan.total_served > b.total_served
                        || (plan.total_served == b.total_served && plan.total_completion() < b.total_completion())
                }
            };
            if better {
                best = Some(plan);
            }
        }

        // Non-empty heuristic list checked above
        let mut best = best.unwrap_or_else(|| GreedyConstruction::new().construct(instance));
        log::info!("{}: best start {} served {}", self.name(), best.algorithm, best.total_served);
        best.algorithm = format!("{} ({})", self.name(), best.algorithm);
        best.computation_time = start.elapsed().as_secs_f64();
        best
    }

    fn name(&self) -> &str {
        "MultiStart"
    }
}
