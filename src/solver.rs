//! The 0/1 integer program solver boundary.
//!
//! The model and decoder only talk to [`IlpSolver`]; any backend that can
//! minimize a linear objective over binary variables subject to linear rows is
//! substitutable.

mod branch_bound;
mod cbc;

use std::fmt;

pub use branch_bound::BranchAndBound;
pub use cbc::CbcCommand;

use crate::error::SolverUnavailable;
use crate::model::Problem;

/// Outcome class reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The solver stopped before proving optimality (limits, interruption).
    NotSolved,
    /// The solver failed or rejected the problem.
    SolverError,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverStatus::Optimal => "Optimal",
            SolverStatus::Infeasible => "Infeasible",
            SolverStatus::Unbounded => "Unbounded",
            SolverStatus::NotSolved => "Not Solved",
            SolverStatus::SolverError => "Solver Error",
        })
    }
}

/// Variable values and the realized objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// One value per variable, indexed by [`crate::model::VarId`].
    pub values: Vec<f64>,
    pub objective: f64,
}

/// What a solver returns: a status, plus an assignment when one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolverStatus,
    pub assignment: Option<Assignment>,
}

impl SolverOutcome {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolverStatus::Optimal,
            assignment: Some(Assignment { values, objective }),
        }
    }

    /// An outcome with no assignment.
    pub fn without_solution(status: SolverStatus) -> Self {
        Self {
            status,
            assignment: None,
        }
    }
}

/// A backend able to minimize a binary integer program.
pub trait IlpSolver {
    /// Backend name, for diagnostics.
    fn name(&self) -> &str;

    /// Solves `problem`. `Err` means the backend could not be run at all;
    /// every other outcome is reported through [`SolverOutcome::status`].
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverUnavailable>;
}

impl<S: IlpSolver + ?Sized> IlpSolver for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverUnavailable> {
        (**self).solve(problem)
    }
}

impl<S: IlpSolver + ?Sized> IlpSolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverUnavailable> {
        (**self).solve(problem)
    }
}
