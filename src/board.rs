//! Board geometry: squares and the knight-move adjacency relation.
//!
//! Squares are addressed by (row, col) with both coordinates in `0..size`.
//! Iteration order is always row-major, which is also the lexicographic order
//! of [`Square`].

/// The canonical board size.
pub const DEFAULT_SIZE: usize = 8;

/// A board coordinate. Ordered by row, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Applies a knight offset, returning `None` if the target leaves the board.
    #[inline]
    fn offset(self, (dr, dc): (i32, i32), size: usize) -> Option<Square> {
        let row = self.row.checked_add_signed(dr as isize)?;
        let col = self.col.checked_add_signed(dc as isize)?;
        (row < size && col < size).then_some(Square { row, col })
    }
}

/// The 8 relative knight moves, as (row, col) offsets.
///
/// Neighbor enumeration follows this order, so constraint terms do too.
pub const KNIGHT_MOVES: [(i32, i32); 8] = [
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
];

/// A square board of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    size: usize,
}

impl Board {
    pub const fn new(size: usize) -> Self {
        Self { size }
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Total number of squares (`size * size`).
    #[inline]
    pub const fn num_squares(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    pub const fn contains(&self, square: Square) -> bool {
        square.row < self.size && square.col < self.size
    }

    /// Converts a square to its row-major index.
    #[inline(always)]
    pub const fn index_of(&self, square: Square) -> usize {
        square.row * self.size + square.col
    }

    /// Converts a row-major index back to a square.
    #[inline(always)]
    pub const fn square_at(&self, index: usize) -> Square {
        Square::new(index / self.size, index % self.size)
    }

    /// All squares in lexicographic order.
    pub fn squares(&self) -> impl Iterator<Item = Square> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Square::new(row, col)))
    }

    /// Squares one knight move away from `square` that stay on the board.
    pub fn knight_neighbors(&self, square: Square) -> impl Iterator<Item = Square> {
        let size = self.size;
        KNIGHT_MOVES
            .iter()
            .filter_map(move |&delta| square.offset(delta, size))
    }

    /// Returns true if `square` holds a knight or is attacked by one.
    pub fn is_covered(&self, square: Square, occupied: impl Fn(Square) -> bool) -> bool {
        occupied(square) || self.knight_neighbors(square).any(occupied)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squares_are_lexicographic() {
        let board = Board::new(5);
        let squares: Vec<Square> = board.squares().collect();
        assert_eq!(squares.len(), 25);
        assert!(squares.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(squares[0], Square::new(0, 0));
        assert_eq!(squares[24], Square::new(4, 4));
    }

    #[test]
    fn test_index_conversion_roundtrip() {
        let board = Board::new(8);
        for (idx, square) in board.squares().enumerate() {
            assert_eq!(board.index_of(square), idx);
            assert_eq!(board.square_at(idx), square);
        }
    }

    #[test]
    fn test_corner_has_two_neighbors() {
        let board = Board::new(8);
        for corner in [(0, 0), (0, 7), (7, 0), (7, 7)] {
            let square = Square::new(corner.0, corner.1);
            assert_eq!(board.knight_neighbors(square).count(), 2, "corner {corner:?}");
        }
    }

    #[test]
    fn test_next_to_corner_has_three_neighbors() {
        let board = Board::new(8);
        assert_eq!(board.knight_neighbors(Square::new(0, 1)).count(), 3);
        assert_eq!(board.knight_neighbors(Square::new(1, 0)).count(), 3);
        assert_eq!(board.knight_neighbors(Square::new(1, 1)).count(), 4);
    }

    #[test]
    fn test_interior_has_eight_neighbors() {
        let board = Board::new(8);
        for row in 2..6 {
            for col in 2..6 {
                assert_eq!(board.knight_neighbors(Square::new(row, col)).count(), 8);
            }
        }
    }

    #[test]
    fn test_tiny_boards() {
        // no knight move fits on a 2x2 board
        let two = Board::new(2);
        assert!(two.squares().all(|s| two.knight_neighbors(s).count() == 0));

        // on 3x3 only the center is isolated
        let three = Board::new(3);
        assert_eq!(three.knight_neighbors(Square::new(1, 1)).count(), 0);
        for square in three.squares().filter(|&s| s != Square::new(1, 1)) {
            assert_eq!(three.knight_neighbors(square).count(), 2, "{square:?}");
        }
    }

    #[test]
    fn test_knight_relation_is_symmetric() {
        let board = Board::new(8);
        for a in board.squares() {
            for b in board.knight_neighbors(a) {
                assert!(board.contains(b));
                assert!(
                    board.knight_neighbors(b).any(|back| back == a),
                    "{a:?} attacks {b:?} but not the reverse"
                );
            }
        }
    }

    #[test]
    fn test_is_covered() {
        let board = Board::new(8);
        let knight = Square::new(3, 3);
        let occupied = |s: Square| s == knight;
        assert!(board.is_covered(knight, occupied));
        assert!(board.is_covered(Square::new(5, 4), occupied));
        assert!(!board.is_covered(Square::new(4, 4), occupied));
    }
}
