use wasm_bindgen::prelude::*;

pub mod board;
pub mod center;
pub mod config;
pub mod game;
pub mod index;
pub mod mirror;
pub mod rules;
pub mod types;
pub mod wasm;

pub use board::{Board, BoardError, DiagramError};
pub use center::{CenterError, GameCenter, MatchId, PlayerRecord, Ranking};
pub use config::{CenterConfig, RuleConfig};
pub use game::{CaptureChain, Match, SharedMatch};
pub use index::PieceIndex;
pub use rules::{MoveError, MoveKind};
pub use types::{BoardView, Cell, Move, Piece, Rank, Side, Square, Status, TurnOutcome, TurnState};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
