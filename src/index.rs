use crate::board::Board;
use crate::types::{NUM_SQUARES, Side, Square};

/// Occupancy masks, one per side, each expressed in that side's own frame.
///
/// Lets the rule scans walk a side's pieces without touching all 64 cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceIndex {
    masks: [u64; 2],
}

impl PieceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the index from the two per-side boards.
    pub fn from_boards(red: &Board, white: &Board) -> Self {
        let mut index = Self::new();
        for board in [red, white] {
            let side = board.owner();
            for (sq, piece) in board.pieces() {
                if piece.side == side {
                    index.insert(side, sq);
                }
            }
        }
        index
    }

    pub fn contains(&self, side: Side, sq: Square) -> bool {
        (self.masks[side.index()] & bit(sq)) != 0
    }

    pub fn count(&self, side: Side) -> usize {
        self.masks[side.index()].count_ones() as usize
    }

    pub fn is_empty(&self, side: Side) -> bool {
        self.masks[side.index()] == 0
    }

    pub fn mask(&self, side: Side) -> u64 {
        self.masks[side.index()]
    }

    /// Squares of `side`'s pieces in `side`'s frame, lowest index first.
    pub fn squares(&self, side: Side) -> impl Iterator<Item = Square> + use<> {
        let mut bits = self.masks[side.index()];
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(Square::from_index(idx))
        })
    }

    /// True when the entry for `board.owner()` lists exactly that side's pieces.
    pub fn agrees_with(&self, board: &Board) -> bool {
        let side = board.owner();
        let mut mask = 0u64;
        for (sq, piece) in board.pieces() {
            if piece.side == side {
                mask |= bit(sq);
            }
        }
        mask == self.masks[side.index()]
    }

    pub(crate) fn insert(&mut self, side: Side, sq: Square) {
        self.masks[side.index()] |= bit(sq);
    }

    pub(crate) fn remove(&mut self, side: Side, sq: Square) {
        self.masks[side.index()] &= !bit(sq);
    }
}

fn bit(sq: Square) -> u64 {
    let pos = sq.index();
    if sq.is_in_bounds() && pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}
