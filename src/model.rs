//! Binary integer program types and the knight domination model.
//!
//! The program types ([`Problem`], [`LinearExpr`], [`Constraint`]) are
//! solver-agnostic: every variable is binary, and variables are addressed by a
//! flat [`VarId`] index into the problem's variable table.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use crate::board::{Board, Square};
use crate::error::ModelError;

/// Handle to a decision variable: an index into [`Problem::var_names`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A linear expression: a list of `(variable, coefficient)` terms.
///
/// Terms keep insertion order so exported models read the way they were built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|var| (var, 1.0)).collect(),
        }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.terms.iter().map(|&(var, _)| var)
    }

    /// Evaluates the expression against per-variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var.index()])
            .sum()
    }
}

/// Constraint relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    fn as_str(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// A named linear constraint `expr <sense> rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Diagnostic identifier; never used for correctness.
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Checks the constraint against per-variable values, with a small tolerance.
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        const TOLERANCE: f64 = 1e-6;
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + TOLERANCE,
            Sense::Ge => lhs >= self.rhs - TOLERANCE,
            Sense::Eq => (lhs - self.rhs).abs() <= TOLERANCE,
        }
    }
}

/// A 0/1 integer program with a minimized objective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    pub name: String,
    /// Variable names, indexed by [`VarId`]. All variables are binary.
    pub var_names: Vec<String>,
    pub objective_name: String,
    /// Minimized.
    pub objective: LinearExpr,
    pub constraints: Vec<Constraint>,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a binary variable and returns its handle.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.var_names.len());
        self.var_names.push(name.into());
        id
    }

    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.var_names[var.index()]
    }

    /// Renders the problem in CPLEX LP format.
    pub fn to_lp(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_lp(&mut out);
        out
    }

    fn write_lp(&self, out: &mut String) -> std::fmt::Result {
        /// Terms per line; long rows are wrapped to keep LP readers happy.
        const TERMS_PER_LINE: usize = 8;

        if !self.name.is_empty() {
            writeln!(out, "\\ {}", self.name)?;
        }
        writeln!(out, "Minimize")?;
        write!(out, " {}: ", self.objective_name)?;
        self.write_expr(out, &self.objective, TERMS_PER_LINE)?;
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for constraint in &self.constraints {
            write!(out, " {}: ", constraint.name)?;
            self.write_expr(out, &constraint.expr, TERMS_PER_LINE)?;
            writeln!(
                out,
                " {} {}",
                constraint.sense.as_str(),
                format_number(constraint.rhs)
            )?;
        }

        writeln!(out, "Binary")?;
        for name in &self.var_names {
            writeln!(out, " {name}")?;
        }
        writeln!(out, "End")
    }

    fn write_expr(
        &self,
        out: &mut String,
        expr: &LinearExpr,
        terms_per_line: usize,
    ) -> std::fmt::Result {
        if expr.terms.is_empty() {
            return write!(out, "0");
        }
        for (i, &(var, coefficient)) in expr.terms.iter().enumerate() {
            if i > 0 {
                if i % terms_per_line == 0 {
                    write!(out, "\n  ")?;
                }
                out.push_str(if coefficient < 0.0 { " - " } else { " + " });
            } else if coefficient < 0.0 {
                out.push_str("- ");
            }
            let magnitude = coefficient.abs();
            if magnitude != 1.0 {
                write!(out, "{} ", format_number(magnitude))?;
            }
            out.push_str(self.var_name(var));
        }
        Ok(())
    }
}

fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value}")
    }
}

/// The knight domination program for one board, with its square/variable mapping.
#[derive(Debug, Clone)]
pub struct KnightModel {
    board: Board,
    /// Square at each variable index.
    squares: Vec<Square>,
    vars: FxHashMap<Square, VarId>,
    problem: Problem,
}

impl KnightModel {
    /// Builds the model for a `size` x `size` board.
    ///
    /// One binary variable per square, the objective is the sum of all
    /// variables, and each square gets a covering row over itself and every
    /// in-bounds knight neighbor.
    pub fn build(size: usize) -> Result<Self, ModelError> {
        if size == 0 {
            return Err(ModelError::EmptyBoard);
        }
        let board = Board::new(size);

        let mut problem = Problem::new(format!("knight domination {size}x{size}"));
        problem.objective_name = "knights".to_string();

        let squares: Vec<Square> = board.squares().collect();
        let mut vars = FxHashMap::default();
        vars.reserve(squares.len());
        for &square in &squares {
            let var = problem.add_binary(format!("x_{}_{}", square.row, square.col));
            vars.insert(square, var);
        }

        problem.objective = LinearExpr::sum(squares.iter().map(|square| vars[square]));

        for &square in &squares {
            // self term first, then neighbors in move order
            let covering = std::iter::once(square)
                .chain(board.knight_neighbors(square))
                .map(|s| vars[&s]);
            problem.constraints.push(Constraint {
                name: format!("cover_{}_{}", square.row, square.col),
                expr: LinearExpr::sum(covering),
                sense: Sense::Ge,
                rhs: 1.0,
            });
        }

        Ok(Self {
            board,
            squares,
            vars,
            problem,
        })
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Variable for a square, or `None` if the square is off the board.
    pub fn var(&self, square: Square) -> Option<VarId> {
        self.vars.get(&square).copied()
    }

    pub fn square_of(&self, var: VarId) -> Square {
        self.squares[var.index()]
    }

    /// Squares in variable order.
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }
}
