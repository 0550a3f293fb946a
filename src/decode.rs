//! Turns a solver outcome back into a knight placement.

use std::collections::BTreeSet;

use crate::board::{Board, Square};
use crate::error::{DecodeError, KnightsError};
use crate::model::KnightModel;
use crate::solver::{Assignment, SolverOutcome, SolverStatus};

/// Maximum distance between the objective and the nearest integer.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Values above this count as a placed knight.
const OCCUPIED_THRESHOLD: f64 = 0.5;

/// A verified minimum placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    board: Board,
    knights: usize,
    occupied: BTreeSet<Square>,
}

impl Placement {
    pub fn board(&self) -> Board {
        self.board
    }

    /// Minimum number of knights.
    pub fn knights(&self) -> usize {
        self.knights
    }

    /// Occupied squares in lexicographic order.
    pub fn occupied(&self) -> &BTreeSet<Square> {
        &self.occupied
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.occupied.contains(&square)
    }
}

/// First square neither occupied nor attacked, if any.
pub fn first_uncovered(board: Board, occupied: &BTreeSet<Square>) -> Option<Square> {
    board
        .squares()
        .find(|&square| !board.is_covered(square, |s| occupied.contains(&s)))
}

/// Decodes `outcome` for `model`.
///
/// Non-optimal statuses never yield a count: infeasible and unbounded are
/// impossible for this model and come back as [`KnightsError::Inconsistent`],
/// the rest as [`KnightsError::NoSolution`].
pub fn decode(model: &KnightModel, outcome: &SolverOutcome) -> Result<Placement, KnightsError> {
    match (outcome.status, &outcome.assignment) {
        (SolverStatus::Optimal, Some(assignment)) => Ok(decode_assignment(model, assignment)?),
        (SolverStatus::Infeasible | SolverStatus::Unbounded, _) => Err(KnightsError::Inconsistent {
            status: outcome.status,
        }),
        // optimal without values is as good as no answer
        (status, _) => Err(KnightsError::NoSolution { status }),
    }
}

/// Decodes an optimal assignment, verifying it describes a dominating placement.
pub fn decode_assignment(
    model: &KnightModel,
    assignment: &Assignment,
) -> Result<Placement, DecodeError> {
    let expected = model.problem().num_vars();
    if assignment.values.len() != expected {
        return Err(DecodeError::AssignmentLength {
            expected,
            got: assignment.values.len(),
        });
    }

    let rounded = assignment.objective.round();
    if !rounded.is_finite()
        || rounded < 0.0
        || (assignment.objective - rounded).abs() > INTEGRALITY_TOLERANCE
    {
        return Err(DecodeError::NonIntegralObjective(assignment.objective));
    }
    let knights = rounded as usize;

    let occupied: BTreeSet<Square> = assignment
        .values
        .iter()
        .zip(model.squares())
        .filter(|&(&value, _)| value > OCCUPIED_THRESHOLD)
        .map(|(_, &square)| square)
        .collect();

    if occupied.len() != knights {
        return Err(DecodeError::CountMismatch {
            objective: knights,
            occupied: occupied.len(),
        });
    }

    let board = model.board();
    if let Some(square) = first_uncovered(board, &occupied) {
        return Err(DecodeError::NotDominating(square));
    }

    Ok(Placement {
        board,
        knights,
        occupied,
    })
}
