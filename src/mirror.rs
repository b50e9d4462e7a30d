use crate::board::{Board, BoardError};
use crate::index::PieceIndex;
use crate::rules::MoveKind;
use crate::types::{BOARD_SIZE, Move, Piece, Side, Square};

const CROWN_ROW: u8 = BOARD_SIZE as u8 - 1;

/// Changes made by one applied move, in the mover's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promoted: bool,
}

/// Both per-side boards and the piece index, mutated only through `apply`.
///
/// Cell (r, c) on Red's board and cell (7 - r, 7 - c) on White's board are the
/// same physical square and always hold the same occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredPosition {
    boards: [Board; 2],
    index: PieceIndex,
}

impl MirroredPosition {
    pub fn new() -> Self {
        Self::from_board(Board::new(Side::Red))
    }

    /// Builds both frames from a board oriented for either side.
    pub fn from_board(board: Board) -> Self {
        let (red, white) = match board.owner() {
            Side::Red => (board, board.mirrored()),
            Side::White => (board.mirrored(), board),
        };
        let index = PieceIndex::from_boards(&red, &white);
        Self {
            boards: [red, white],
            index,
        }
    }

    pub fn board(&self, side: Side) -> &Board {
        &self.boards[side.index()]
    }

    pub fn index(&self) -> &PieceIndex {
        &self.index
    }

    /// Moves the piece in both frames, removes a jumped piece and crowns on
    /// the far row. `kind` must come from classifying `mv` for `side`.
    pub fn apply(&mut self, side: Side, mv: Move, kind: MoveKind) -> Result<Applied, BoardError> {
        let other = side.opponent();
        let piece = self.boards[side.index()]
            .get(mv.from)?
            .ok_or(BoardError::Empty {
                row: mv.from.row,
                col: mv.from.col,
            })?;

        let captured = match kind {
            MoveKind::Step => None,
            MoveKind::Capture { over } => {
                let taken = self.clear(side, over)?;
                if taken.is_some() {
                    self.index.remove(other, over.mirrored());
                }
                taken
            }
        };

        self.clear(side, mv.from)?;
        self.index.remove(side, mv.from);

        let promoted = !piece.is_royal() && mv.to.row == CROWN_ROW;
        let landed = if promoted { piece.crowned() } else { piece };
        self.put(side, mv.to, landed)?;
        self.index.insert(side, mv.to);

        debug_assert!(self.is_consistent());
        Ok(Applied {
            piece: landed,
            captured,
            promoted,
        })
    }

    /// True when the two frames mirror each other and the index agrees with both.
    pub fn is_consistent(&self) -> bool {
        let [red, white] = &self.boards;
        red.mirrored() == *white && self.index.agrees_with(red) && self.index.agrees_with(white)
    }

    fn clear(&mut self, side: Side, sq: Square) -> Result<Option<Piece>, BoardError> {
        let taken = self.boards[side.index()].set(sq, None)?;
        self.boards[side.opponent().index()].set(sq.mirrored(), None)?;
        Ok(taken)
    }

    fn put(&mut self, side: Side, sq: Square, piece: Piece) -> Result<(), BoardError> {
        self.boards[side.index()].set(sq, Some(piece))?;
        self.boards[side.opponent().index()].set(sq.mirrored(), Some(piece))?;
        Ok(())
    }
}

impl Default for MirroredPosition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_the_piece_in_both_frames() {
        let mut position = MirroredPosition::new();
        let mv = Move::new(Square::new(2, 1), Square::new(3, 2));

        let applied = position.apply(Side::Red, mv, MoveKind::Step).unwrap();

        assert_eq!(applied.captured, None);
        assert!(!applied.promoted);
        assert_eq!(
            position.board(Side::White).get(Square::new(4, 5)).unwrap(),
            Some(Piece::ordinary(Side::Red))
        );
        assert_eq!(position.board(Side::White).get(Square::new(5, 6)).unwrap(), None);
        assert!(position.is_consistent());
    }

    #[test]
    fn capture_removes_the_jumped_piece_from_both_frames_and_index() {
        let board = Board::from_diagram(
            Side::White,
            "
            .-.-.-.-
            -.-.-.-.
            .-.-.-.-
            -.-.-.-.
            .-.-.-.-
            -.-r-.-.
            .-w-.-.-
            -.-.-.-.",
        )
        .unwrap();
        let mut position = MirroredPosition::from_board(board);
        let mv = Move::new(Square::new(1, 2), Square::new(3, 4));

        let applied = position
            .apply(Side::White, mv, MoveKind::Capture { over: Square::new(2, 3) })
            .unwrap();

        assert_eq!(applied.captured, Some(Piece::ordinary(Side::Red)));
        assert!(position.index().is_empty(Side::Red));
        assert_eq!(position.board(Side::Red).count(Side::Red), 0);
        assert_eq!(
            position.board(Side::Red).get(Square::new(4, 3)).unwrap(),
            Some(Piece::ordinary(Side::White))
        );
        assert!(position.is_consistent());
    }

    #[test]
    fn reaching_the_far_row_crowns_in_both_frames() {
        let board =
            Board::from_pieces(Side::Red, [(Square::new(6, 1), Piece::ordinary(Side::Red))])
                .unwrap();
        let mut position = MirroredPosition::from_board(board);

        let applied = position
            .apply(Side::Red, Move::new(Square::new(6, 1), Square::new(7, 0)), MoveKind::Step)
            .unwrap();

        assert!(applied.promoted);
        assert_eq!(
            position.board(Side::Red).get(Square::new(7, 0)).unwrap(),
            Some(Piece::royal(Side::Red))
        );
        assert_eq!(
            position.board(Side::White).get(Square::new(0, 7)).unwrap(),
            Some(Piece::royal(Side::Red))
        );
    }

    #[test]
    fn empty_origin_is_reported_as_empty_and_changes_nothing() {
        let mut position = MirroredPosition::new();
        let before = position.clone();
        let mv = Move::new(Square::new(3, 2), Square::new(4, 3));

        let err = position.apply(Side::Red, mv, MoveKind::Step).unwrap_err();

        assert_eq!(err, BoardError::Empty { row: 3, col: 2 });
        assert_eq!(position, before);
    }
}
