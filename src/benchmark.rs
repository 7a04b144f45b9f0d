//! Batch runs over a directory of instances.
//!
//! Runs the constructive drivers (and optionally the exact solver) on every
//! instance, records one row per algorithm and instance, and summarizes the
//! rows per algorithm.

use crate::error::Result;
use crate::exact::{ExactSolver, GurobiBackend, GurobiConfig};
use crate::heuristics::construction::*;
use crate::instance::{natural_cmp, Instance};
use crate::solution::RoutePlan;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Extension of instance files
pub const INSTANCE_EXTENSION: &str = "rmc";

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub timestamp: DateTime<Utc>,
    pub instance: String,
    pub algorithm: String,
    pub vehicles: usize,
    pub customers: usize,
    pub total_demand: i32,
    pub served_demand: i32,
    pub served_customers: usize,
    /// Fraction of the total demand that was served
    pub service_rate: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Exact runs only
    pub status: Option<String>,
    /// Exact runs only
    pub bound: Option<f64>,
}

impl BatchRecord {
    fn new(instance: &Instance, plan: &RoutePlan) -> Self {
        let total_demand = instance.total_demand();
        BatchRecord {
            timestamp: Utc::now(),
            instance: instance.name().to_string(),
            algorithm: plan.algorithm.clone(),
            vehicles: instance.vehicles().len(),
            customers: instance.customers().len(),
            total_demand,
            served_demand: plan.total_served,
            served_customers: plan.served.len(),
            service_rate: if total_demand > 0 { plan.total_served as f64 / total_demand as f64 } else { 1.0 },
            time: plan.computation_time,
            status: None,
            bound: None,
        }
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub algorithm: String,
    pub runs: usize,
    pub mean_served: f64,
    pub std_served: f64,
    pub mean_rate: f64,
    pub median_rate: f64,
    pub mean_time: f64,
    /// Instances on which this algorithm served the most demand (ties count for all)
    pub best_count: usize,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Randomized greedy runs per instance
    pub random_starts: u64,
    /// Also run the exact solver, warm-started from the multi-start plan
    pub run_exact: bool,
    pub exact_time_limit: f64,
    /// Process instances in parallel
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            random_starts: 8,
            run_exact: false,
            exact_time_limit: 300.0,
            parallel: true,
            show_progress: true,
        }
    }
}

pub struct Batch {
    config: BatchConfig,
    records: Vec<BatchRecord>,
}

impl Batch {
    pub fn new(config: BatchConfig) -> Self {
        Batch { config, records: Vec::new() }
    }

    /// Every algorithm on one instance
    pub fn run_instance(&self, instance: &Instance) -> Vec<BatchRecord> {
        log::info!("Running batch on instance: {}", instance.name());
        let heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> = vec![
            Box::new(GreedyConstruction::new()),
            Box::new(GreedyConstruction::tightest_deadline()),
            Box::new(GreedyConstruction::randomized(1)),
        ];

        let mut records: Vec<BatchRecord> = heuristics
            .iter()
            .map(|h| BatchRecord::new(instance, &h.construct(instance)))
            .collect();

        let best = MultiStartConstruction::with_random_starts(self.config.random_starts).construct(instance);
        records.push(BatchRecord::new(instance, &best));

        if self.config.run_exact {
            if let Some(record) = self.run_exact(instance, best) {
                records.push(record);
            }
        }
        records
    }

    fn run_exact(&self, instance: &Instance, warm_start: RoutePlan) -> Option<BatchRecord> {
        let config = GurobiConfig { time_limit: self.config.exact_time_limit, ..Default::default() };
        let solver = ExactSolver::new(GurobiBackend::new(config)).with_warm_start(warm_start);
        match solver.solve(instance) {
            Ok(result) => {
                let mut record = BatchRecord::new(instance, &result.plan);
                record.status = Some(result.status);
                record.bound = Some(result.bound);
                Some(record)
            }
            Err(e) => {
                log::error!("Exact solver failed on {}: {}", instance.name(), e);
                None
            }
        }
    }

    pub fn run_on_instances(&mut self, instances: &[Instance]) {
        let progress = if self.config.show_progress {
            ProgressBar::new(instances.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            progress.set_style(style);
        }

        let run = |instance: &Instance| {
            let records = self.run_instance(instance);
            progress.set_message(instance.name().to_string());
            progress.inc(1);
            records
        };
        let batches: Vec<Vec<BatchRecord>> = if self.config.parallel {
            instances.par_iter().map(run).collect()
        } else {
            instances.iter().map(run).collect()
        };
        progress.finish_with_message("done");

        self.records.extend(batches.into_iter().flatten());
    }

    /// Statistics per algorithm, best mean service rate first
    pub fn summarize(&self) -> Vec<AlgorithmSummary> {
        // Multi-start and exact names embed the winning start; group on the prefix
        let family = |r: &BatchRecord| r.algorithm.split(" (").next().unwrap_or(&r.algorithm).to_string();

        let mut best_per_instance: BTreeMap<&str, i32> = BTreeMap::new();
        for r in &self.records {
            let best = best_per_instance.entry(r.instance.as_str()).or_insert(r.served_demand);
            *best = (*best).max(r.served_demand);
        }

        let mut groups: BTreeMap<String, Vec<&BatchRecord>> = BTreeMap::new();
        for r in &self.records {
            groups.entry(family(r)).or_default().push(r);
        }

        let mut summaries: Vec<AlgorithmSummary> = groups
            .into_iter()
            .map(|(algorithm, records)| {
                let served: Vec<f64> = records.iter().map(|r| r.served_demand as f64).collect();
                let rates: Vec<f64> = records.iter().map(|r| r.service_rate).collect();
                let times: Vec<f64> = records.iter().map(|r| r.time).collect();
                let std_served = if served.len() > 1 { served.iter().std_dev() } else { 0.0 };
                AlgorithmSummary {
                    algorithm,
                    runs: records.len(),
                    mean_served: served.iter().mean(),
                    std_served,
                    mean_rate: rates.iter().mean(),
                    median_rate: Data::new(rates).median(),
                    mean_time: times.iter().mean(),
                    best_count: records
                        .iter()
                        .filter(|r| best_per_instance.get(r.instance.as_str()) == Some(&r.served_demand))
                        .count(),
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.mean_rate.total_cmp(&a.mean_rate));
        summaries
    }

    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for record in &self.records {
            writer.serialize(record).map_err(std::io::Error::from)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn export_summary_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for summary in self.summarize() {
            writer.serialize(summary).map_err(std::io::Error::from)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str("========================================\n");
        report.push_str("          Batch Report\n");
        report.push_str("========================================\n\n");

        let rule = "-".repeat(86);
        report.push_str(&format!(
            "{:<28} {:>6} {:>12} {:>10} {:>10} {:>8} {:>8}\n",
            "Algorithm", "Runs", "Mean served", "Std", "Mean rate", "Best", "Time"
        ));
        report.push_str(&rule);
        report.push('\n');
        for s in self.summarize() {
            report.push_str(&format!(
                "{:<28} {:>6} {:>12.2} {:>10.2} {:>9.1}% {:>8} {:>8.4}\n",
                s.algorithm,
                s.runs,
                s.mean_served,
                s.std_served,
                s.mean_rate * 100.0,
                s.best_count,
                s.mean_time
            ));
        }
        report.push_str(&rule);
        report.push('\n');
        report
    }

    pub fn records(&self) -> &[BatchRecord] {
        &self.records
    }
}

/// Load every `.rmc` instance of a directory; unreadable files are skipped
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |e| e == INSTANCE_EXTENSION))
        .collect();
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

    let mut instances = Vec::with_capacity(paths.len());
    for path in paths {
        match Instance::from_file(&path) {
            Ok(instance) => instances.push(instance),
            Err(e) => log::warn!("Skipping {:?}: {}", path, e),
        }
    }
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn quiet() -> BatchConfig {
        BatchConfig { random_starts: 2, show_progress: false, ..Default::default() }
    }

    #[test]
    fn test_batch_records_every_algorithm() {
        let instances = vec![
            Instance::parse_str(fixtures::SPLIT, "split").unwrap(),
            Instance::parse_str(fixtures::UNREACHABLE, "unreachable").unwrap(),
        ];
        let mut batch = Batch::new(quiet());
        batch.run_on_instances(&instances);

        assert_eq!(batch.records().len(), 8);
        let split: Vec<_> = batch.records().iter().filter(|r| r.instance == "split").collect();
        assert!(split.iter().all(|r| r.served_demand == 20 && r.service_rate == 1.0));
        let unreachable: Vec<_> = batch.records().iter().filter(|r| r.instance == "unreachable").collect();
        assert!(unreachable.iter().all(|r| r.served_demand == 10 && r.service_rate == 0.5));
    }

    #[test]
    fn test_summary_groups_by_algorithm() {
        let instances = vec![
            Instance::parse_str(fixtures::SPLIT, "split").unwrap(),
            Instance::parse_str(fixtures::UNREACHABLE, "unreachable").unwrap(),
        ];
        let mut batch = Batch::new(BatchConfig { parallel: false, ..quiet() });
        batch.run_on_instances(&instances);

        let summaries = batch.summarize();
        assert_eq!(summaries.len(), 4);
        for s in &summaries {
            assert_eq!(s.runs, 2);
            assert_eq!(s.mean_served, 15.0);
            assert_eq!(s.median_rate, 0.75);
            assert_eq!(s.best_count, 2);
        }
        assert!(summaries.iter().any(|s| s.algorithm == "MultiStart"));
        assert!(batch.generate_report().contains("Greedy-EarliestStart"));
    }
}
