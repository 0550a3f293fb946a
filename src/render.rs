//! Text rendering of placements.
//!
//! Rows are printed top to bottom starting at row 0, with column indices in a
//! header line and row indices down the left edge:
//!
//! ```text
//!   | 0 1 2
//! --+------
//! 0 | . . .
//! 1 | . N N
//! 2 | . N N
//! ```

use crate::board::Square;
use crate::decode::Placement;

/// Symbol for an empty square.
pub const EMPTY: char = '.';
/// Symbol for a square holding a knight.
pub const KNIGHT: char = 'N';

/// Number of decimal digits needed to print `value`.
fn digits(value: usize) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Formats the board grid of a placement.
pub fn format_board(placement: &Placement) -> String {
    let board = placement.board();
    let size = board.size();
    // indices and cells share one width so columns line up past 10
    let width = digits(size.saturating_sub(1));

    let mut output = String::new();

    output.push_str(&format!("{:width$} |", ""));
    for col in 0..size {
        output.push_str(&format!(" {col:>width$}"));
    }
    output.push('\n');

    output.push_str(&"-".repeat(width + 1));
    output.push('+');
    output.push_str(&"-".repeat(size * (width + 1)));
    output.push('\n');

    for row in 0..size {
        output.push_str(&format!("{row:>width$} |"));
        for col in 0..size {
            let symbol = if placement.is_occupied(Square::new(row, col)) {
                KNIGHT
            } else {
                EMPTY
            };
            output.push_str(&format!(" {symbol:>width$}"));
        }
        output.push('\n');
    }

    output
}

/// Formats the status/count summary followed by the board.
pub fn format_report(placement: &Placement) -> String {
    let size = placement.board().size();
    format!(
        "Status: Optimal\nMinimum knights for {size}x{size}: {}\n\n{}",
        placement.knights(),
        format_board(placement)
    )
}
