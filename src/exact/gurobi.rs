//! Gurobi backend.
//!
//! Translates a [`LinearProgram`] variable by variable and constraint by
//! constraint into a Gurobi model, then reads the incumbent back in program
//! order.

use super::{GurobiConfig, MipBackend, SolverOutcome};
use crate::error::{CdpError, Result};
use crate::exact::model::{ConstraintSense, LinearExpr, LinearProgram, ObjectiveSense, VarKind};
use grb::expr::LinExpr;
use grb::prelude::*;

fn failed(context: &'static str) -> impl Fn(grb::Error) -> CdpError {
    move |e| CdpError::Solver(format!("{}: {}", context, e))
}

fn to_expr(expr: &LinearExpr, vars: &[Var]) -> Expr {
    let mut lin = LinExpr::new();
    for &(v, coeff) in &expr.terms {
        lin.add_term(coeff, vars[v.0]);
    }
    lin.add_constant(expr.constant);
    lin.into()
}

/// Gurobi-based MIP backend
pub struct GurobiBackend {
    pub config: GurobiConfig,
}

impl GurobiBackend {
    pub fn new(config: GurobiConfig) -> Self {
        GurobiBackend { config }
    }
}

impl MipBackend for GurobiBackend {
    fn solve(&self, program: &LinearProgram, warm_start: Option<&[f64]>) -> Result<SolverOutcome> {
        let env = Env::new("").map_err(failed("Failed to create Gurobi environment"))?;
        let mut model = Model::with_env(&program.name, env).map_err(failed("Failed to create model"))?;

        model.set_param(param::TimeLimit, self.config.time_limit).map_err(failed("Failed to set time limit"))?;
        model.set_param(param::MIPGap, self.config.mip_gap).map_err(failed("Failed to set MIP gap"))?;
        model.set_param(param::Threads, self.config.threads).map_err(failed("Failed to set threads"))?;
        if !self.config.verbose {
            model.set_param(param::OutputFlag, 0).map_err(failed("Failed to set output flag"))?;
        }

        let mut vars: Vec<Var> = Vec::with_capacity(program.num_variables());
        for v in program.variables() {
            let var = match v.kind {
                VarKind::Binary => add_binvar!(model, name: &v.name),
                VarKind::Integer => add_intvar!(model, name: &v.name, bounds: v.lower..v.upper),
                VarKind::Continuous => add_ctsvar!(model, name: &v.name, bounds: v.lower..v.upper),
            }
            .map_err(failed("Failed to add variable"))?;
            vars.push(var);
        }
        model.update().map_err(failed("Failed to update model"))?;

        for constraint in program.constraints() {
            let lhs = to_expr(&constraint.expr, &vars);
            let rhs = constraint.rhs;
            let constr = match constraint.sense {
                ConstraintSense::LessEqual => c!(lhs <= rhs),
                ConstraintSense::GreaterEqual => c!(lhs >= rhs),
                ConstraintSense::Equal => c!(lhs == rhs),
            };
            model.add_constr(&constraint.name, constr).map_err(failed("Failed to add constraint"))?;
        }

        let sense = match program.objective_sense() {
            ObjectiveSense::Maximize => ModelSense::Maximize,
            ObjectiveSense::Minimize => ModelSense::Minimize,
        };
        model
            .set_objective(to_expr(program.objective(), &vars), sense)
            .map_err(failed("Failed to set objective"))?;

        if let Some(values) = warm_start {
            for (var, &value) in vars.iter().zip(values) {
                model.set_obj_attr(attr::Start, var, value).map_err(failed("Failed to set warm start"))?;
            }
        }

        model.update().map_err(failed("Failed to update model before optimization"))?;
        model.optimize().map_err(failed("Optimization failed"))?;

        let status = model.status().map_err(failed("Failed to get status"))?;
        let status_str = match status {
            Status::Optimal => "Optimal",
            Status::TimeLimit => "TimeLimit",
            Status::Infeasible => "Infeasible",
            Status::InfOrUnbd => "InfeasibleOrUnbounded",
            Status::Unbounded => "Unbounded",
            Status::NodeLimit => "NodeLimit",
            Status::SolutionLimit => "SolutionLimit",
            Status::Interrupted => "Interrupted",
            _ => "Unknown",
        }
        .to_string();

        if status == Status::Infeasible {
            if let Some(path) = &self.config.iis_path {
                let _ = model.compute_iis();
                match model.write(path) {
                    Ok(()) => log::warn!("Gurobi reported infeasible model; IIS written to {}", path),
                    Err(e) => log::warn!("Gurobi reported infeasible model; could not write IIS: {}", e),
                }
            }
        }

        let solutions = model.get_attr(attr::SolCount).unwrap_or(0);
        if solutions == 0 {
            return Ok(SolverOutcome::NoIncumbent { status: status_str });
        }

        let mut values = Vec::with_capacity(vars.len());
        for var in &vars {
            values.push(model.get_obj_attr(attr::X, var).map_err(failed("Failed to read solution"))?);
        }

        Ok(SolverOutcome::Feasible {
            values,
            objective: model.get_attr(attr::ObjVal).map_err(failed("Failed to read objective"))?,
            bound: model.get_attr(attr::ObjBound).unwrap_or(f64::INFINITY),
            optimal: status == Status::Optimal,
            status: status_str,
            nodes_explored: model.get_attr(attr::NodeCount).unwrap_or(0.0) as i64,
        })
    }

    fn name(&self) -> &str {
        "Gurobi"
    }
}
