use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;
const LAST: u8 = BOARD_SIZE as u8 - 1;

/// One of the two participants. Red moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    White,
}

impl Side {
    pub const ALL: [Self; 2] = [Self::Red, Self::White];

    pub const fn opponent(self) -> Self {
        match self {
            Self::Red => Self::White,
            Self::White => Self::Red,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::White => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Ordinary,
    Royal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub side: Side,
    pub rank: Rank,
}

impl Piece {
    pub const fn ordinary(side: Side) -> Self {
        Self {
            side,
            rank: Rank::Ordinary,
        }
    }

    pub const fn royal(side: Side) -> Self {
        Self {
            side,
            rank: Rank::Royal,
        }
    }

    pub const fn is_royal(self) -> bool {
        matches!(self.rank, Rank::Royal)
    }

    /// Rank only ever goes ordinary -> royal.
    pub const fn crowned(self) -> Self {
        Self::royal(self.side)
    }
}

/// A board coordinate in some side's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub const fn is_in_bounds(self) -> bool {
        self.row <= LAST && self.col <= LAST
    }

    /// Only squares with an odd coordinate sum are ever played on.
    pub const fn is_playable(self) -> bool {
        self.is_in_bounds() && (self.row + self.col) % 2 == 1
    }

    /// The same physical square seen from the other side of the table.
    pub const fn mirrored(self) -> Self {
        Self {
            row: LAST.saturating_sub(self.row),
            col: LAST.saturating_sub(self.col),
        }
    }

    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i16 + d_row as i16;
        let col = self.col as i16 + d_col as i16;
        let range = 0..BOARD_SIZE as i16;
        if range.contains(&row) && range.contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Row-major index in `0..64`. Caller must have checked bounds.
    pub const fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    pub const fn from_index(idx: usize) -> Self {
        Self::new((idx / BOARD_SIZE) as u8, (idx % BOARD_SIZE) as u8)
    }
}

/// A single ply as submitted by a caller, in the mover's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Status {
    InProgress,
    Resigned { by: Side },
    Ended { winner: Side },
}

impl Status {
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub const fn winner(self) -> Option<Side> {
        match self {
            Self::InProgress => None,
            Self::Resigned { by } => Some(by.opponent()),
            Self::Ended { winner } => Some(winner),
        }
    }
}

/// Whether the mover keeps the turn after an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TurnState {
    /// Same side again; the piece on `active` must keep capturing.
    Continues { active: Square },
    Passed { to: Side },
}

/// Result of an accepted `submit_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub captured: Option<Piece>,
    pub promoted: bool,
    pub turn: TurnState,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
    pub playable: bool,
    pub occupant: Option<Piece>,
}

/// Per-side snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub side: Side,
    pub turn: Side,
    pub status: Status,
    pub help_requested: bool,
    /// Square the mover must continue capturing from, in this side's frame.
    pub active: Option<Square>,
    pub rows: Vec<Vec<Cell>>,
    /// CRC32 over occupancy and turn, for cheap change detection while polling.
    pub digest: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_square_keeps_playable_parity() {
        for idx in 0..NUM_SQUARES {
            let sq = Square::from_index(idx);
            assert_eq!(sq.is_playable(), sq.mirrored().is_playable());
            assert_eq!(sq.mirrored().mirrored(), sq);
        }
    }

    #[test]
    fn offset_rejects_leaving_the_board() {
        assert_eq!(Square::new(0, 1).offset(-1, 1), None);
        assert_eq!(Square::new(7, 6).offset(0, 2), None);
        assert_eq!(Square::new(2, 3).offset(2, -2), Some(Square::new(4, 1)));
    }

    #[test]
    fn resigned_status_names_the_other_side_as_winner() {
        assert_eq!(Status::Resigned { by: Side::Red }.winner(), Some(Side::White));
        assert_eq!(Status::Ended { winner: Side::Red }.winner(), Some(Side::Red));
        assert_eq!(Status::InProgress.winner(), None);
        assert!(!Status::InProgress.is_over());
    }
}
