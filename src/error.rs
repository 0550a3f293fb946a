//! Error types for model construction, solving and decoding.

use thiserror::Error;

use crate::board::Square;
use crate::solver::SolverStatus;

/// Failure to build a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("board size must be at least 1")]
    EmptyBoard,
}

/// The solver backend could not be invoked at all.
#[derive(Debug, Error)]
pub enum SolverUnavailable {
    /// The solver executable was not found.
    #[error("solver executable `{0}` not found")]
    NotFound(String),
    /// Spawning the solver or exchanging files with it failed.
    #[error("failed to run solver `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    /// The solver ran but produced output that could not be read.
    #[error("unreadable solver output: {0}")]
    Output(String),
}

/// An optimal assignment that does not describe a valid placement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("assignment has {got} values, model has {expected} variables")]
    AssignmentLength { expected: usize, got: usize },
    #[error("objective value {0} is not integral")]
    NonIntegralObjective(f64),
    #[error("objective reports {objective} knights but {occupied} squares are occupied")]
    CountMismatch { objective: usize, occupied: usize },
    #[error("square ({}, {}) is neither occupied nor attacked", .0.row, .0.col)]
    NotDominating(Square),
}

/// Everything that can go wrong between building a model and holding a placement.
#[derive(Debug, Error)]
pub enum KnightsError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    SolverUnavailable(#[from] SolverUnavailable),
    /// Infeasible or unbounded. The covering program is always feasible and
    /// bounded, so this points at the model or the solver integration.
    #[error("solver reported {status} for an always-feasible model")]
    Inconsistent { status: SolverStatus },
    /// The solver stopped without an answer.
    #[error("no solution available (status: {status})")]
    NoSolution { status: SolverStatus },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
