use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::{RwLock, RwLockReadGuard};
use web_time::Instant;

use crate::board::Board;
use crate::config::RuleConfig;
use crate::index::PieceIndex;
use crate::mirror::MirroredPosition;
use crate::rules::{self, MoveError, MoveKind};
use crate::types::{BoardView, Move, Piece, Side, Square, Status, TurnOutcome, TurnState};

/// Capture sequence state for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureChain {
    #[default]
    Idle,
    /// The piece on `active` (mover's frame) just captured and can capture again.
    Chained { active: Square },
}

impl CaptureChain {
    pub fn active(self) -> Option<Square> {
        match self {
            Self::Idle => None,
            Self::Chained { active } => Some(active),
        }
    }
}

/// One game between two named players.
#[derive(Debug, Clone)]
pub struct Match {
    players: [String; 2],
    position: MirroredPosition,
    turn: Side,
    chain: CaptureChain,
    captured: Vec<Piece>,
    status: Status,
    help_requested: bool,
    rules: RuleConfig,
    last_activity: Instant,
}

impl Match {
    /// Starts a match from the opening position. Red moves first.
    pub fn new(red: impl Into<String>, white: impl Into<String>) -> Self {
        Self::with_rules(red, white, RuleConfig::default())
    }

    pub fn with_rules(red: impl Into<String>, white: impl Into<String>, rules: RuleConfig) -> Self {
        Self::build(red.into(), white.into(), MirroredPosition::new(), Side::Red, rules)
    }

    /// Starts a match from an arbitrary position. `board` may be oriented for
    /// either side.
    pub fn from_position(
        red: impl Into<String>,
        white: impl Into<String>,
        board: Board,
        turn: Side,
        rules: RuleConfig,
    ) -> Self {
        Self::build(red.into(), white.into(), MirroredPosition::from_board(board), turn, rules)
    }

    fn build(
        red: String,
        white: String,
        position: MirroredPosition,
        turn: Side,
        rules: RuleConfig,
    ) -> Self {
        info!("match created: {red} (red) vs {white} (white)");
        let mut game = Self {
            players: [red, white],
            position,
            turn,
            chain: CaptureChain::Idle,
            captured: Vec::new(),
            status: Status::InProgress,
            help_requested: false,
            rules,
            last_activity: Instant::now(),
        };
        game.end_if_stuck();
        game
    }

    pub fn player(&self, side: Side) -> &str {
        &self.players[side.index()]
    }

    pub fn side_of(&self, name: &str) -> Option<Side> {
        Side::ALL.into_iter().find(|side| self.player(*side) == name)
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn chain(&self) -> CaptureChain {
        self.chain
    }

    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// `side`'s board, oriented with its own pieces starting near row 0.
    pub fn board(&self, side: Side) -> &Board {
        self.position.board(side)
    }

    pub fn index(&self) -> &PieceIndex {
        self.position.index()
    }

    pub fn is_consistent(&self) -> bool {
        self.position.is_consistent()
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Validates and plays one ply for `side`. On any error nothing changes.
    pub fn submit_move(&mut self, side: Side, mv: Move) -> Result<TurnOutcome, MoveError> {
        if self.status.is_over() {
            return Err(MoveError::MatchAlreadyOver);
        }
        if side != self.turn {
            return Err(MoveError::NotYourTurn);
        }
        if self.help_requested {
            return Err(MoveError::HelpPending);
        }

        let kind = rules::classify(
            self.position.board(side),
            self.position.index(),
            side,
            mv,
            self.chain.active(),
            &self.rules,
        )?;
        let mut next = self.position.clone();
        let applied = next.apply(side, mv, kind)?;

        self.position = next;
        self.last_activity = Instant::now();
        if let Some(piece) = applied.captured {
            self.captured.push(piece);
        }
        debug!(
            "{side:?} {:?} ({}, {}) -> ({}, {})",
            kind, mv.from.row, mv.from.col, mv.to.row, mv.to.col
        );

        let continues = matches!(kind, MoveKind::Capture { .. })
            && rules::can_capture_from(self.position.board(side), mv.to, &self.rules);
        let turn = if continues {
            self.chain = CaptureChain::Chained { active: mv.to };
            debug!("{side:?} must continue capturing from ({}, {})", mv.to.row, mv.to.col);
            TurnState::Continues { active: mv.to }
        } else {
            self.chain = CaptureChain::Idle;
            self.pass_turn();
            TurnState::Passed { to: self.turn }
        };

        Ok(TurnOutcome {
            captured: applied.captured,
            promoted: applied.promoted,
            turn,
            status: self.status,
        })
    }

    fn pass_turn(&mut self) {
        self.turn = self.turn.opponent();
        self.end_if_stuck();
    }

    /// Ends the match when the side to move has no pieces or no legal move.
    fn end_if_stuck(&mut self) {
        let side = self.turn;
        let index = self.position.index();
        let stuck = index.is_empty(side)
            || !rules::has_any_move(self.position.board(side), index, side, &self.rules);
        if stuck {
            let winner = side.opponent();
            self.status = Status::Ended { winner };
            info!("match over: {} ({winner:?}) wins", self.player(winner));
        }
    }

    /// Concedes for `side`. A second call reports `MatchAlreadyOver`.
    pub fn resign(&mut self, side: Side) -> Result<Status, MoveError> {
        if self.status.is_over() {
            return Err(MoveError::MatchAlreadyOver);
        }
        self.status = Status::Resigned { by: side };
        self.chain = CaptureChain::Idle;
        self.last_activity = Instant::now();
        info!("{} ({side:?}) resigned", self.player(side));
        Ok(self.status)
    }

    /// Toggles the help flag and returns its new value. While set, every move
    /// is refused with `HelpPending`.
    pub fn request_help(&mut self) -> Result<bool, MoveError> {
        if self.status.is_over() {
            return Err(MoveError::MatchAlreadyOver);
        }
        self.help_requested = !self.help_requested;
        self.last_activity = Instant::now();
        Ok(self.help_requested)
    }

    /// Clears the help flag. Returns whether it was set.
    pub fn acknowledge_help(&mut self) -> bool {
        self.last_activity = Instant::now();
        std::mem::take(&mut self.help_requested)
    }

    /// Pieces taken by `side`, oldest first.
    pub fn captured_pieces(&self, side: Side) -> Vec<Piece> {
        self.captured
            .iter()
            .copied()
            .filter(|piece| piece.side != side)
            .collect()
    }

    /// Every capture in the match, most recent last.
    pub fn capture_history(&self) -> &[Piece] {
        &self.captured
    }

    pub fn last_captured(&self) -> Option<Piece> {
        self.captured.last().copied()
    }

    /// Moves `side` may submit right now, in `side`'s frame.
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        if self.status.is_over() || side != self.turn || self.help_requested {
            return Vec::new();
        }
        let board = self.position.board(side);
        if let Some(active) = self.chain.active() {
            return rules::captures_from(board, active, &self.rules);
        }

        let squares: Vec<Square> = self.position.index().squares(side).collect();
        let captures: Vec<Move> = squares
            .iter()
            .flat_map(|&sq| rules::captures_from(board, sq, &self.rules))
            .collect();
        if !captures.is_empty() {
            return captures;
        }
        squares
            .iter()
            .flat_map(|&sq| rules::steps_from(board, sq))
            .collect()
    }

    /// Snapshot oriented for `side`.
    pub fn board_view(&self, side: Side) -> BoardView {
        let board = self.position.board(side);
        let active = self.chain.active().map(|sq| {
            if side == self.turn { sq } else { sq.mirrored() }
        });

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&board.to_array());
        hasher.update(&[
            self.turn.index() as u8,
            self.status.is_over() as u8,
            self.help_requested as u8,
        ]);

        BoardView {
            side,
            turn: self.turn,
            status: self.status,
            help_requested: self.help_requested,
            active,
            rows: board.cells(),
            digest: hasher.finalize(),
        }
    }
}

/// A match shared between both players' call paths.
///
/// Mutations hold the write lock for their whole run; snapshots take the read
/// lock, so no reader ever sees a half-applied move.
#[derive(Debug, Clone)]
pub struct SharedMatch {
    inner: Arc<RwLock<Match>>,
}

impl SharedMatch {
    pub fn new(game: Match) -> Self {
        Self {
            inner: Arc::new(RwLock::new(game)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Match> {
        self.inner.read()
    }

    pub fn submit_move(&self, side: Side, mv: Move) -> Result<TurnOutcome, MoveError> {
        self.inner.write().submit_move(side, mv)
    }

    pub fn resign(&self, side: Side) -> Result<Status, MoveError> {
        self.inner.write().resign(side)
    }

    pub fn request_help(&self) -> Result<bool, MoveError> {
        self.inner.write().request_help()
    }

    pub fn acknowledge_help(&self) -> bool {
        self.inner.write().acknowledge_help()
    }

    pub fn board_view(&self, side: Side) -> BoardView {
        self.inner.read().board_view(side)
    }

    pub fn status(&self) -> Status {
        self.inner.read().status()
    }

    pub fn turn(&self) -> Side {
        self.inner.read().turn()
    }

    pub fn captured_pieces(&self, side: Side) -> Vec<Piece> {
        self.inner.read().captured_pieces(side)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
