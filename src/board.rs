use std::fmt;

use thiserror::Error;

use crate::types::{BOARD_SIZE, Cell, NUM_SQUARES, Piece, Rank, Side, Square};

/// Rows each side fills at the start, counted from its own edge.
const HOME_ROWS: u8 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("square ({row}, {col}) is out of bounds")]
    OutOfBounds { row: u8, col: u8 },
    #[error("square ({row}, {col}) is not playable")]
    NotPlayable { row: u8, col: u8 },
    #[error("square ({row}, {col}) is empty")]
    Empty { row: u8, col: u8 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
    #[error("malformed board diagram: {0}")]
    Malformed(String),
    #[error("board error")]
    Board(#[from] BoardError),
}

/// 8x8 checkers board seen from `owner`'s side of the table.
///
/// The owner's pieces start on rows 0..3 and move towards row 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    owner: Side,
    cells: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates the starting position for `owner`.
    pub fn new(owner: Side) -> Self {
        let mut board = Self::empty(owner);
        let far = BOARD_SIZE as u8 - HOME_ROWS;
        for idx in 0..NUM_SQUARES {
            let sq = Square::from_index(idx);
            if !sq.is_playable() {
                continue;
            }
            board.cells[sq.row as usize][sq.col as usize] = if sq.row < HOME_ROWS {
                Some(Piece::ordinary(owner))
            } else if sq.row >= far {
                Some(Piece::ordinary(owner.opponent()))
            } else {
                None
            };
        }
        board
    }

    pub fn empty(owner: Side) -> Self {
        Self {
            owner,
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from explicit placements in `owner`'s frame.
    pub fn from_pieces<I>(owner: Side, pieces: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = (Square, Piece)>,
    {
        let mut board = Self::empty(owner);
        for (sq, piece) in pieces {
            board.set(sq, Some(piece))?;
        }
        Ok(board)
    }

    /// Parses eight lines, row 7 first. `r`/`w` are ordinary pieces, `R`/`W`
    /// royal ones, `.` and `-` are empty.
    pub fn from_diagram(owner: Side, diagram: &str) -> Result<Self, DiagramError> {
        let lines: Vec<&str> = diagram
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != BOARD_SIZE {
            return Err(DiagramError::Malformed(format!(
                "expected {BOARD_SIZE} rows, got {}",
                lines.len()
            )));
        }

        let mut board = Self::empty(owner);
        for (line_idx, line) in lines.iter().enumerate() {
            let row = (BOARD_SIZE - 1 - line_idx) as u8;
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != BOARD_SIZE {
                return Err(DiagramError::Malformed(format!(
                    "row {row} has {} squares",
                    symbols.len()
                )));
            }
            for (col, symbol) in symbols.into_iter().enumerate() {
                let piece = match symbol {
                    '.' | '-' => None,
                    'r' => Some(Piece::ordinary(Side::Red)),
                    'R' => Some(Piece::royal(Side::Red)),
                    'w' => Some(Piece::ordinary(Side::White)),
                    'W' => Some(Piece::royal(Side::White)),
                    other => {
                        return Err(DiagramError::Malformed(format!(
                            "unknown symbol {other:?} in row {row}"
                        )));
                    }
                };
                if piece.is_some() {
                    board.set(Square::new(row, col as u8), piece)?;
                }
            }
        }
        Ok(board)
    }

    pub fn owner(&self) -> Side {
        self.owner
    }

    pub fn is_in_bounds(&self, sq: Square) -> bool {
        sq.is_in_bounds()
    }

    pub fn is_playable(&self, sq: Square) -> Result<bool, BoardError> {
        check_bounds(sq)?;
        Ok(sq.is_playable())
    }

    pub fn get(&self, sq: Square) -> Result<Option<Piece>, BoardError> {
        check_bounds(sq)?;
        Ok(self.cells[sq.row as usize][sq.col as usize])
    }

    /// Writes a cell and returns its previous occupant.
    pub(crate) fn set(
        &mut self,
        sq: Square,
        piece: Option<Piece>,
    ) -> Result<Option<Piece>, BoardError> {
        check_bounds(sq)?;
        if !sq.is_playable() {
            return Err(BoardError::NotPlayable {
                row: sq.row,
                col: sq.col,
            });
        }
        let cell = &mut self.cells[sq.row as usize][sq.col as usize];
        Ok(std::mem::replace(cell, piece))
    }

    /// Infallible lookup for the rule scans; off-board squares read as empty.
    pub(crate) fn occupant(&self, sq: Square) -> Option<Piece> {
        if sq.is_in_bounds() {
            self.cells[sq.row as usize][sq.col as usize]
        } else {
            None
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..NUM_SQUARES).filter_map(move |idx| {
            let sq = Square::from_index(idx);
            self.occupant(sq).map(|piece| (sq, piece))
        })
    }

    pub fn count(&self, side: Side) -> usize {
        self.pieces().filter(|(_, piece)| piece.side == side).count()
    }

    /// The same position as seen by the opponent.
    pub fn mirrored(&self) -> Self {
        let mut out = Self::empty(self.owner.opponent());
        for (sq, piece) in self.pieces() {
            let m = sq.mirrored();
            out.cells[m.row as usize][m.col as usize] = Some(piece);
        }
        out
    }

    /// Converts board to `[u8; 64]`: 0=empty, 1=red, 2=white, 3=red royal, 4=white royal.
    pub fn to_array(&self) -> [u8; NUM_SQUARES] {
        let mut out = [0u8; NUM_SQUARES];
        for (sq, piece) in self.pieces() {
            out[sq.index()] = match (piece.side, piece.rank) {
                (Side::Red, Rank::Ordinary) => 1,
                (Side::White, Rank::Ordinary) => 2,
                (Side::Red, Rank::Royal) => 3,
                (Side::White, Rank::Royal) => 4,
            };
        }
        out
    }

    pub fn cells(&self) -> Vec<Vec<Cell>> {
        (0..BOARD_SIZE as u8)
            .map(|row| {
                (0..BOARD_SIZE as u8)
                    .map(|col| {
                        let sq = Square::new(row, col);
                        Cell {
                            row,
                            col,
                            playable: sq.is_playable(),
                            occupant: self.occupant(sq),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..BOARD_SIZE as u8).rev() {
            for col in 0..BOARD_SIZE as u8 {
                let sq = Square::new(row, col);
                let symbol = match self.occupant(sq) {
                    None if sq.is_playable() => '.',
                    None => '-',
                    Some(piece) => {
                        let c = match piece.side {
                            Side::Red => 'r',
                            Side::White => 'w',
                        };
                        if piece.is_royal() { c.to_ascii_uppercase() } else { c }
                    }
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn check_bounds(sq: Square) -> Result<(), BoardError> {
    if sq.is_in_bounds() {
        Ok(())
    } else {
        Err(BoardError::OutOfBounds {
            row: sq.row,
            col: sq.col,
        })
    }
}
