//! Knight Domination Solver Library
//!
//! Finds the smallest set of knights that occupies or attacks every square of
//! a board. The board is turned into a binary integer program
//! ([`model::KnightModel`]), handed to any [`solver::IlpSolver`], and the
//! result is decoded and verified ([`decode::decode`]).

pub mod board;
pub mod decode;
pub mod error;
pub mod model;
pub mod render;
pub mod solver;

use decode::Placement;
use error::KnightsError;
use model::KnightModel;
use solver::IlpSolver;

/// Builds the model for a `size` x `size` board, solves it, and decodes the result.
///
/// Each call builds a fresh model; nothing is cached between calls.
pub fn solve(size: usize, solver: &dyn IlpSolver) -> Result<Placement, KnightsError> {
    let model = KnightModel::build(size)?;
    let outcome = solver.solve(model.problem())?;
    decode::decode(&model, &outcome)
}
