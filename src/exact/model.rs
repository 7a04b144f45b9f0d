//! Solver-agnostic linear/integer programs.
//!
//! A [`LinearProgram`] is a list of bounded variables, named linear
//! constraints and a linear objective. Backends translate it into their own
//! modelling API; the program can also be written in CPLEX LP format and used
//! to check a candidate assignment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::ops::Sub;

/// Index of a variable in its program
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// `f64::INFINITY` when unbounded
    pub upper: f64,
}

/// Linear expression `Σ coeff · var + constant`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(v: VarId) -> Self {
        LinearExpr { terms: vec![(v, 1.0)], constant: 0.0 }
    }

    pub fn constant(value: f64) -> Self {
        LinearExpr { terms: Vec::new(), constant: value }
    }

    /// `Σ coeff · v` over the given variables
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I, coeff: f64) -> Self {
        LinearExpr { terms: vars.into_iter().map(|v| (v, coeff)).collect(), constant: 0.0 }
    }

    pub fn plus(mut self, v: VarId, coeff: f64) -> Self {
        self.terms.push((v, coeff));
        self
    }

    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn add_term(&mut self, v: VarId, coeff: f64) {
        self.terms.push((v, coeff));
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.0]).sum::<f64>() + self.constant
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: LinearExpr) -> LinearExpr {
        self.terms.extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl ConstraintSense {
    fn symbol(self) -> &'static str {
        match self {
            ConstraintSense::LessEqual => "<=",
            ConstraintSense::GreaterEqual => ">=",
            ConstraintSense::Equal => "=",
        }
    }
}

/// `expr sense rhs`, with every variable on the left
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// A constraint or bound that an assignment does not satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub value: f64,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} {} does not hold", self.name, self.value, self.sense.symbol(), self.rhs)
    }
}

/// A linear/integer program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearProgram {
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
    sense: ObjectiveSense,
    #[serde(skip)]
    by_name: HashMap<String, VarId>,
}

impl LinearProgram {
    pub fn new(name: impl Into<String>) -> Self {
        LinearProgram {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
            sense: ObjectiveSense::Maximize,
            by_name: HashMap::new(),
        }
    }

    fn add_var(&mut self, name: String, kind: VarKind, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.by_name.insert(name.clone(), id);
        self.variables.push(Variable { name, kind, lower, upper });
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name.into(), VarKind::Binary, 0.0, 1.0)
    }

    pub fn add_integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarKind::Integer, lower, upper)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name.into(), VarKind::Continuous, lower, upper)
    }

    /// Add `lhs sense rhs`; both sides may hold variables and constants
    pub fn add_constraint(&mut self, name: impl Into<String>, lhs: LinearExpr, sense: ConstraintSense, rhs: LinearExpr) {
        let mut expr = lhs - rhs;
        let rhs = 0.0 - expr.constant;
        expr.constant = 0.0;
        self.constraints.push(Constraint { name: name.into(), expr, sense, rhs });
    }

    pub fn set_objective(&mut self, objective: LinearExpr, sense: ObjectiveSense) {
        self.objective = objective;
        self.sense = sense;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn objective_sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Bounds, integrality and constraints not satisfied by `values`, within `tol`
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (v, &value) in self.variables.iter().zip(values) {
            if value < v.lower - tol {
                violations.push(Violation { name: v.name.clone(), value, sense: ConstraintSense::GreaterEqual, rhs: v.lower });
            }
            if value > v.upper + tol {
                violations.push(Violation { name: v.name.clone(), value, sense: ConstraintSense::LessEqual, rhs: v.upper });
            }
            if v.kind != VarKind::Continuous && (value - value.round()).abs() > tol {
                violations.push(Violation { name: v.name.clone(), value, sense: ConstraintSense::Equal, rhs: value.round() });
            }
        }

        for c in &self.constraints {
            let value = c.expr.evaluate(values);
            let holds = match c.sense {
                ConstraintSense::LessEqual => value <= c.rhs + tol,
                ConstraintSense::GreaterEqual => value >= c.rhs - tol,
                ConstraintSense::Equal => (value - c.rhs).abs() <= tol,
            };
            if !holds {
                violations.push(Violation { name: c.name.clone(), value, sense: c.sense, rhs: c.rhs });
            }
        }

        violations
    }

    fn write_expr<W: Write>(&self, w: &mut W, expr: &LinearExpr) -> io::Result<()> {
        let mut first = true;
        for &(v, coeff) in &expr.terms {
            if coeff == 0.0 {
                continue;
            }
            let name = &self.variables[v.0].name;
            let sign = if coeff < 0.0 { "-" } else if first { "" } else { "+" };
            let magnitude = coeff.abs();
            let sep = if first && sign.is_empty() { "" } else { " " };
            if magnitude == 1.0 {
                write!(w, " {}{}{}", sign, sep, name)?;
            } else {
                write!(w, " {}{}{} {}", sign, sep, magnitude, name)?;
            }
            first = false;
        }
        if first {
            // LP format wants at least one variable per row
            match self.variables.first() {
                Some(v) => write!(w, " 0 {}", v.name)?,
                None => write!(w, " 0")?,
            }
        }
        Ok(())
    }

    /// Write the program in CPLEX LP format
    pub fn write_lp<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "\\ Problem: {}", self.name)?;
        match self.sense {
            ObjectiveSense::Maximize => writeln!(w, "Maximize")?,
            ObjectiveSense::Minimize => writeln!(w, "Minimize")?,
        }
        write!(w, " obj:")?;
        self.write_expr(w, &self.objective)?;
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        for c in &self.constraints {
            write!(w, " {}:", c.name)?;
            self.write_expr(w, &c.expr)?;
            writeln!(w, " {} {}", c.sense.symbol(), c.rhs)?;
        }

        writeln!(w, "Bounds")?;
        for v in self.variables.iter().filter(|v| v.kind != VarKind::Binary) {
            match (v.lower.is_finite(), v.upper.is_finite()) {
                (true, true) => writeln!(w, " {} <= {} <= {}", v.lower, v.name, v.upper)?,
                (true, false) => writeln!(w, " {} >= {}", v.name, v.lower)?,
                (false, true) => writeln!(w, " -inf <= {} <= {}", v.name, v.upper)?,
                (false, false) => writeln!(w, " {} free", v.name)?,
            }
        }

        let binaries: Vec<&str> = self.variables.iter().filter(|v| v.kind == VarKind::Binary).map(|v| v.name.as_str()).collect();
        if !binaries.is_empty() {
            writeln!(w, "Binaries")?;
            for chunk in binaries.chunks(8) {
                writeln!(w, " {}", chunk.join(" "))?;
            }
        }
        let generals: Vec<&str> = self.variables.iter().filter(|v| v.kind == VarKind::Integer).map(|v| v.name.as_str()).collect();
        if !generals.is_empty() {
            writeln!(w, "Generals")?;
            for chunk in generals.chunks(8) {
                writeln!(w, " {}", chunk.join(" "))?;
            }
        }
        writeln!(w, "End")
    }

    pub fn to_lp_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_lp(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> LinearProgram {
        let mut lp = LinearProgram::new("knap");
        let a = lp.add_binary("a");
        let b = lp.add_binary("b");
        let t = lp.add_integer("t", 0.0, f64::INFINITY);
        lp.add_constraint("cap", LinearExpr::var(a).plus(b, 2.0), ConstraintSense::LessEqual, LinearExpr::constant(2.0));
        lp.add_constraint("link", LinearExpr::var(t), ConstraintSense::GreaterEqual, LinearExpr::var(a).plus_constant(3.0));
        lp.set_objective(LinearExpr::var(a).plus(b, 5.0), ObjectiveSense::Maximize);
        lp
    }

    #[test]
    fn test_constants_move_to_rhs() {
        let lp = knapsack();
        let link = lp.constraint("link").unwrap();
        assert_eq!(link.rhs, 3.0);
        assert_eq!(link.expr.terms, vec![(VarId(2), 1.0), (VarId(0), -1.0)]);
    }

    #[test]
    fn test_violations() {
        let lp = knapsack();
        assert!(lp.violations(&[0.0, 1.0, 3.0], 1e-6).is_empty());

        let names: Vec<String> = lp.violations(&[1.0, 1.0, 3.5], 1e-6).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["t", "cap", "link"]);
        assert_eq!(lp.evaluate_objective(&[0.0, 1.0, 3.0]), 5.0);
    }

    #[test]
    fn test_write_lp() {
        let text = knapsack().to_lp_string();
        assert!(text.contains("Maximize\n obj: a + 5 b\n"));
        assert!(text.contains(" cap: a + 2 b <= 2\n"));
        assert!(text.contains(" link: t - a >= 3\n"));
        assert!(text.contains(" t >= 0\n"));
        assert!(text.contains("Binaries\n a b\n"));
        assert!(text.contains("Generals\n t\n"));
        assert!(text.ends_with("End\n"));
    }
}
