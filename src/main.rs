//! CDP Solver - Command Line Interface
//!
//! Split-delivery routing through relay stations: constructive heuristics,
//! exact MIP solving, LP export and batch runs.

use cdp_solver::benchmark::{load_instances_from_dir, Batch, BatchConfig};
use cdp_solver::exact::formulation::Formulation;
use cdp_solver::exact::{ExactSolver, GurobiBackend, GurobiConfig};
use cdp_solver::heuristics::construction::*;
use cdp_solver::instance::Instance;
use cdp_solver::solution::RoutePlan;
use cdp_solver::visualization::Visualizer;
use cdp_solver::{Result, VisitGraph};
use clap::{Parser, Subcommand, ValueEnum};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cdp-solver")]
#[command(version = "1.0")]
#[command(about = "Split-delivery vehicle routing through relay stations")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "multi-start")]
        algorithm: Algorithm,

        /// Exact solver time limit in seconds
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Randomized runs of the multi-start driver
        #[arg(long, default_value = "8")]
        starts: u64,

        /// Big-M of the time-propagation constraints
        #[arg(long, default_value = "1000000")]
        big_m: f64,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate map and timeline images next to the instance
        #[arg(long)]
        visualize: bool,
    },

    /// Analyze an instance
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Write the MIP formulation in LP format
    ExportLp {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "1000000")]
        big_m: f64,
    },

    /// Run every algorithm on a directory of instances
    Batch {
        /// Directory containing .rmc instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Randomized runs of the multi-start driver
        #[arg(long, default_value = "8")]
        starts: u64,

        /// Run exact solver (requires Gurobi)
        #[arg(long)]
        exact: bool,

        /// Exact solver time limit
        #[arg(long, default_value = "300")]
        exact_time_limit: f64,

        /// Process instances one at a time
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Greedy construction, earliest action first
    Greedy,
    /// Greedy construction, tightest deadline first
    Tightest,
    /// Randomized greedy construction
    Randomized,
    /// Multi-start construction
    MultiStart,
    /// Exact solver (Gurobi), warm-started from multi-start
    Exact,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let outcome = match cli.command {
        Commands::Solve { instance, algorithm, time_limit, seed, starts, big_m, output, visualize } => {
            solve_instance(&instance, algorithm, time_limit, seed, starts, big_m, output, visualize, cli.verbose)
        }
        Commands::Analyze { instance } => analyze_instance(&instance),
        Commands::ExportLp { instance, output, big_m } => export_lp(&instance, &output, big_m),
        Commands::Batch { dir, output, starts, exact, exact_time_limit, sequential } => {
            let config = BatchConfig {
                random_starts: starts,
                run_exact: exact,
                exact_time_limit,
                parallel: !sequential,
                ..Default::default()
            };
            run_batch(&dir, &output, config)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    time_limit: f64,
    seed: u64,
    starts: u64,
    big_m: f64,
    output: Option<PathBuf>,
    visualize: bool,
    verbose: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = Instance::from_file(path)?;
    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving with {:?} algorithm...", algorithm);
    let start = Instant::now();

    let plan = match algorithm {
        Algorithm::Greedy => GreedyConstruction::new().construct(&instance),
        Algorithm::Tightest => GreedyConstruction::tightest_deadline().construct(&instance),
        Algorithm::Randomized => GreedyConstruction::randomized(seed).construct(&instance),
        Algorithm::MultiStart => MultiStartConstruction::with_random_starts(starts).construct(&instance),
        Algorithm::Exact => {
            let warm_start = MultiStartConstruction::with_random_starts(starts).construct(&instance);
            println!("Warm start serves {}", warm_start.total_served);

            let config = GurobiConfig { time_limit, verbose, ..Default::default() };
            let solver = ExactSolver::new(GurobiBackend::new(config))
                .with_big_m(big_m)
                .with_warm_start(warm_start);
            let result = solver.solve(&instance)?;
            println!("Status: {}", result.status);
            println!("Upper bound: {:.2}", result.bound);
            println!("Gap: {:.4}%", result.gap * 100.0);
            println!("Nodes explored: {}", result.nodes_explored);
            result.plan
        }
    };

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("{}", plan);
    println!("Total time: {:.4}s", elapsed.as_secs_f64());

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&plan).map_err(std::io::Error::from)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if visualize {
        save_images(path, &instance, &plan)?;
    }
    Ok(())
}

fn save_images(path: &Path, instance: &Instance, plan: &RoutePlan) -> Result<()> {
    let viz = Visualizer::new();
    let images = [
        ("png", "svg", viz.generate_svg(instance, plan)),
        ("timeline.png", "timeline.svg", viz.generate_timeline_svg(instance, plan)),
    ];
    for (png, svg_ext, svg) in images {
        let png_path = path.with_extension(png);
        match viz.save_png(&svg, &png_path) {
            Ok(()) => println!("Visualization saved to {:?}", png_path),
            Err(e) => {
                let svg_path = path.with_extension(svg_ext);
                viz.save_svg(&svg, &svg_path)?;
                println!("PNG conversion failed ({}). Saved SVG to {:?}", e, svg_path);
            }
        }
    }
    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = Instance::from_file(path)?;
    println!("{}", instance.statistics());

    let graph = VisitGraph::build(&instance);
    let formulation = Formulation::build(&instance, &graph);
    println!("Visit graph: {} nodes", graph.len());
    println!(
        "Formulation: {} variables, {} constraints",
        formulation.program().num_variables(),
        formulation.program().num_constraints()
    );

    println!("\nCustomers:");
    println!("{:<8} {:>8} {:>8} {:>8} {:>6}", "Id", "Demand", "Start", "End", "Slots");
    for (c, customer) in instance.customers().iter().enumerate() {
        println!(
            "{:<8} {:>8} {:>8} {:>8} {:>6}",
            customer.id,
            customer.demand,
            customer.earliest,
            customer.latest,
            instance.slot_count(c)
        );
    }

    println!("\nVehicles:");
    for vehicle in instance.vehicles() {
        println!("  {}: capacity {}, service {}", vehicle.id, vehicle.capacity, vehicle.service_length);
    }
    Ok(())
}

fn export_lp(path: &Path, output: &Path, big_m: f64) -> Result<()> {
    let instance = Instance::from_file(path)?;
    let graph = VisitGraph::build(&instance);
    let formulation = Formulation::with_big_m(&instance, &graph, big_m);

    let mut writer = BufWriter::new(File::create(output)?);
    formulation.program().write_lp(&mut writer)?;
    writer.flush()?;
    println!(
        "Wrote {} variables and {} constraints to {:?}",
        formulation.program().num_variables(),
        formulation.program().num_constraints(),
        output
    );
    Ok(())
}

fn run_batch(dir: &Path, output: &Path, config: BatchConfig) -> Result<()> {
    println!("Loading instances from {:?}...", dir);
    let instances = load_instances_from_dir(dir)?;
    if instances.is_empty() {
        println!("No instances found");
        return Ok(());
    }
    println!("Loaded {} instances", instances.len());

    std::fs::create_dir_all(output)?;
    let mut batch = Batch::new(config);
    batch.run_on_instances(&instances);

    batch.export_to_csv(output.join("results.csv"))?;
    batch.export_summary_csv(output.join("summary.csv"))?;
    println!("{}", batch.generate_report());
    println!("Results saved to {:?}", output);
    Ok(())
}
