//! Move classification and capture scans.
//!
//! Every function here works on one side's own board, where that side's
//! ordinary pieces advance towards increasing rows.

use thiserror::Error;

use crate::board::{Board, BoardError};
use crate::config::RuleConfig;
use crate::index::PieceIndex;
use crate::types::{Move, Piece, Side, Square};

const FORWARD: [(i8, i8); 2] = [(1, -1), (1, 1)];
const ALL_DIAGONALS: [(i8, i8); 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];

/// Why a submitted move was refused. Squares are in the mover's frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("square ({}, {}) is out of bounds", .at.row, .at.col)]
    OutOfBounds { at: Square },
    #[error("no piece of the moving side at ({}, {})", .at.row, .at.col)]
    NoPieceAtOrigin { at: Square },
    #[error("destination ({}, {}) is occupied or not playable", .at.row, .at.col)]
    DestinationOccupiedOrInvalid { at: Square },
    #[error("a move must cover one or two diagonal squares")]
    IllegalDistance { from: Square, to: Square },
    #[error("ordinary pieces only move forward")]
    IllegalDirection { from: Square, to: Square },
    #[error("nothing to capture at ({}, {})", .at.row, .at.col)]
    EmptyCaptureTarget { at: Square },
    #[error("cannot capture own piece at ({}, {})", .at.row, .at.col)]
    CannotCaptureOwnPiece { at: Square },
    #[error("a capture is available and must be taken")]
    MustCapture,
    #[error("the piece at ({}, {}) must keep capturing", .active.row, .active.col)]
    MustContinueCapture { active: Square },
    #[error("only the piece at ({}, {}) may continue capturing", .active.row, .active.col)]
    WrongPieceForContinuedCapture { active: Square },
    #[error("it is not this side's turn")]
    NotYourTurn,
    #[error("match is already over")]
    MatchAlreadyOver,
    #[error("help must be acknowledged before moving")]
    HelpPending,
}

impl From<BoardError> for MoveError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfBounds { row, col } => Self::OutOfBounds {
                at: Square::new(row, col),
            },
            BoardError::NotPlayable { row, col } => Self::DestinationOccupiedOrInvalid {
                at: Square::new(row, col),
            },
            BoardError::Empty { row, col } => Self::NoPieceAtOrigin {
                at: Square::new(row, col),
            },
        }
    }
}

/// A validated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Step,
    /// Jumps the opponent piece standing on `over`.
    Capture { over: Square },
}

fn step_directions(piece: Piece) -> &'static [(i8, i8)] {
    if piece.is_royal() { &ALL_DIAGONALS } else { &FORWARD }
}

fn capture_directions(piece: Piece, rules: &RuleConfig) -> &'static [(i8, i8)] {
    if piece.is_royal() || rules.backward_captures {
        &ALL_DIAGONALS
    } else {
        &FORWARD
    }
}

/// Capture moves open to the piece on `from`.
pub fn captures_from(board: &Board, from: Square, rules: &RuleConfig) -> Vec<Move> {
    let Some(piece) = board.occupant(from) else {
        return Vec::new();
    };
    capture_directions(piece, rules)
        .iter()
        .filter_map(|&(dr, dc)| {
            let over = from.offset(dr, dc)?;
            let to = from.offset(2 * dr, 2 * dc)?;
            let target = board.occupant(over)?;
            (target.side != piece.side && board.occupant(to).is_none())
                .then_some(Move::new(from, to))
        })
        .collect()
}

/// Plain one-square moves open to the piece on `from`.
pub fn steps_from(board: &Board, from: Square) -> Vec<Move> {
    let Some(piece) = board.occupant(from) else {
        return Vec::new();
    };
    step_directions(piece)
        .iter()
        .filter_map(|&(dr, dc)| {
            let to = from.offset(dr, dc)?;
            board.occupant(to).is_none().then_some(Move::new(from, to))
        })
        .collect()
}

pub fn can_capture_from(board: &Board, from: Square, rules: &RuleConfig) -> bool {
    !captures_from(board, from, rules).is_empty()
}

/// Every square the piece on `from` could reach by geometry alone, captures first.
/// Forced capture and chain restrictions are applied by the match.
pub fn legal_destinations(board: &Board, from: Square, rules: &RuleConfig) -> Vec<Square> {
    captures_from(board, from, rules)
        .into_iter()
        .chain(steps_from(board, from))
        .map(|mv| mv.to)
        .collect()
}

/// Forced-capture check over all of `side`'s pieces.
pub fn has_any_capture(board: &Board, index: &PieceIndex, side: Side, rules: &RuleConfig) -> bool {
    index
        .squares(side)
        .any(|sq| can_capture_from(board, sq, rules))
}

pub fn has_any_move(board: &Board, index: &PieceIndex, side: Side, rules: &RuleConfig) -> bool {
    index
        .squares(side)
        .any(|sq| !steps_from(board, sq).is_empty() || can_capture_from(board, sq, rules))
}

/// Validates `mv` for `side` on `side`'s own board.
///
/// `chain` is the square a capture sequence must continue from, if any.
pub fn classify(
    board: &Board,
    index: &PieceIndex,
    side: Side,
    mv: Move,
    chain: Option<Square>,
    rules: &RuleConfig,
) -> Result<MoveKind, MoveError> {
    debug_assert_eq!(board.owner(), side);
    let Move { from, to } = mv;

    let piece = board
        .get(from)?
        .filter(|piece| piece.side == side)
        .ok_or(MoveError::NoPieceAtOrigin { at: from })?;
    if let Some(active) = chain
        && active != from
    {
        return Err(MoveError::WrongPieceForContinuedCapture { active });
    }
    if !board.is_playable(to)? || board.get(to)?.is_some() {
        return Err(MoveError::DestinationOccupiedOrInvalid { at: to });
    }

    let d_row = to.row as i8 - from.row as i8;
    let d_col = to.col as i8 - from.col as i8;
    if d_row.abs() != d_col.abs() || !(1..=2).contains(&d_row.abs()) {
        return Err(MoveError::IllegalDistance { from, to });
    }

    if d_row.abs() == 1 {
        if let Some(active) = chain {
            return Err(MoveError::MustContinueCapture { active });
        }
        if has_any_capture(board, index, side, rules) {
            return Err(MoveError::MustCapture);
        }
        if !step_directions(piece).contains(&(d_row, d_col)) {
            return Err(MoveError::IllegalDirection { from, to });
        }
        return Ok(MoveKind::Step);
    }

    if !capture_directions(piece, rules).contains(&(d_row / 2, d_col / 2)) {
        return Err(MoveError::IllegalDirection { from, to });
    }
    let over = from
        .offset(d_row / 2, d_col / 2)
        .ok_or(MoveError::OutOfBounds { at: to })?;
    match board.occupant(over) {
        None => Err(MoveError::EmptyCaptureTarget { at: over }),
        Some(target) if target.side == side => Err(MoveError::CannotCaptureOwnPiece { at: over }),
        Some(_) => Ok(MoveKind::Capture { over }),
    }
}
