//! Registry of signed-in players and their matches.
//!
//! The registry lock is never held while a match lock is taken, so matches
//! stay independent of each other.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Instant;

use crate::config::CenterConfig;
use crate::game::{Match, SharedMatch};
use crate::rules::MoveError;
use crate::types::{BoardView, Move, Side, Status, TurnOutcome};

pub type MatchId = u32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CenterError {
    #[error("invalid player name {0:?}")]
    InvalidName(String),
    #[error("name {0:?} is already taken")]
    NameTaken(String),
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),
    #[error("player {0:?} is already in a match")]
    Busy(String),
    #[error("a player cannot challenge themselves")]
    SelfChallenge,
    #[error("player {0:?} is not in a match")]
    NoMatch(String),
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Win/loss tally kept per player name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    pub games: u32,
    pub won: u32,
    pub lost: u32,
    pub pieces_taken: u32,
    pub pieces_lost: u32,
}

impl PlayerRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            games: 0,
            won: 0,
            lost: 0,
            pieces_taken: 0,
            pieces_lost: 0,
        }
    }

    /// Wins per game played, `None` before the first game.
    pub fn ratio(&self) -> Option<f32> {
        (self.games > 0).then(|| self.won as f32 / self.games as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ranking {
    Games,
    Won,
    Lost,
    PiecesTaken,
    PiecesLost,
}

impl Ranking {
    fn key(self, record: &PlayerRecord) -> u32 {
        match self {
            Self::Games => record.games,
            Self::Won => record.won,
            Self::Lost => record.lost,
            Self::PiecesTaken => record.pieces_taken,
            Self::PiecesLost => record.pieces_lost,
        }
    }
}

#[derive(Debug)]
struct PlayerState {
    record: PlayerRecord,
    online: bool,
    current: Option<MatchId>,
}

#[derive(Debug)]
struct Entry {
    game: SharedMatch,
    recorded: bool,
    left: [bool; 2],
}

#[derive(Debug, Default)]
struct Registry {
    next_id: MatchId,
    players: BTreeMap<String, PlayerState>,
    matches: HashMap<MatchId, Entry>,
}

impl Registry {
    fn seat(&self, name: &str) -> Result<(MatchId, SharedMatch), CenterError> {
        let state = self
            .players
            .get(name)
            .ok_or_else(|| CenterError::UnknownPlayer(name.to_string()))?;
        state
            .current
            .and_then(|id| self.matches.get(&id).map(|entry| (id, entry.game.clone())))
            .ok_or_else(|| CenterError::NoMatch(name.to_string()))
    }
}

/// Final numbers of an ended match, read before the registry is locked.
struct Settlement {
    winner: Side,
    players: [String; 2],
    taken: [u32; 2],
}

#[derive(Debug, Default)]
pub struct GameCenter {
    config: CenterConfig,
    registry: Mutex<Registry>,
}

impl GameCenter {
    pub fn new(config: CenterConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &CenterConfig {
        &self.config
    }

    /// Signs a player in, reusing their record if they played before.
    pub fn sign_in(&self, name: &str) -> Result<(), CenterError> {
        if !self.is_valid_name(name) {
            return Err(CenterError::InvalidName(name.to_string()));
        }
        let mut registry = self.registry.lock();
        let state = registry
            .players
            .entry(name.to_string())
            .or_insert_with(|| PlayerState {
                record: PlayerRecord::new(name),
                online: false,
                current: None,
            });
        if state.online {
            return Err(CenterError::NameTaken(name.to_string()));
        }
        state.online = true;
        info!("{name} signed in");
        Ok(())
    }

    /// Leaves any current match, then marks the player offline.
    pub fn sign_out(&self, name: &str) -> Result<(), CenterError> {
        match self.leave(name) {
            Ok(()) | Err(CenterError::NoMatch(_)) => {}
            Err(err) => return Err(err),
        }
        let mut registry = self.registry.lock();
        if let Some(state) = registry.players.get_mut(name) {
            state.online = false;
        }
        info!("{name} signed out");
        Ok(())
    }

    fn is_valid_name(&self, name: &str) -> bool {
        name.chars().count() <= self.config.max_name_len
            && name.chars().any(|c| c.is_ascii_alphanumeric())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
    }

    /// Names of signed-in players, sorted.
    pub fn players(&self) -> Vec<String> {
        let registry = self.registry.lock();
        registry
            .players
            .iter()
            .filter(|(_, state)| state.online)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Pairs two idle players. The challenger plays red and moves first.
    pub fn challenge(
        &self,
        challenger: &str,
        opponent: &str,
    ) -> Result<(MatchId, SharedMatch), CenterError> {
        let rules = self.config.rules;
        self.open_match(challenger, opponent, |red, white| {
            Match::with_rules(red, white, rules)
        })
    }

    /// Registers the match built by `create` once both players are online and
    /// idle. `create` receives the red and white names.
    fn open_match<F>(
        &self,
        challenger: &str,
        opponent: &str,
        create: F,
    ) -> Result<(MatchId, SharedMatch), CenterError>
    where
        F: FnOnce(&str, &str) -> Match,
    {
        if challenger == opponent {
            return Err(CenterError::SelfChallenge);
        }
        let mut registry = self.registry.lock();
        for name in [challenger, opponent] {
            match registry.players.get(name) {
                Some(state) if state.online && state.current.is_none() => {}
                Some(state) if state.online => return Err(CenterError::Busy(name.to_string())),
                _ => return Err(CenterError::UnknownPlayer(name.to_string())),
            }
        }

        let id = registry.next_id;
        registry.next_id += 1;
        let game = SharedMatch::new(create(challenger, opponent));
        registry.matches.insert(
            id,
            Entry {
                game: game.clone(),
                recorded: false,
                left: [false; 2],
            },
        );
        for name in [challenger, opponent] {
            if let Some(state) = registry.players.get_mut(name) {
                state.current = Some(id);
            }
        }
        Ok((id, game))
    }

    pub fn match_of(&self, name: &str) -> Result<(MatchId, SharedMatch), CenterError> {
        self.registry.lock().seat(name)
    }

    pub fn get(&self, id: MatchId) -> Option<SharedMatch> {
        self.registry
            .lock()
            .matches
            .get(&id)
            .map(|entry| entry.game.clone())
    }

    pub fn active_matches(&self) -> usize {
        self.registry.lock().matches.len()
    }

    fn side_in(name: &str, game: &SharedMatch) -> Result<Side, CenterError> {
        game.read()
            .side_of(name)
            .ok_or_else(|| CenterError::NoMatch(name.to_string()))
    }

    pub fn submit_move(&self, name: &str, mv: Move) -> Result<TurnOutcome, CenterError> {
        let (id, game) = self.match_of(name)?;
        let side = Self::side_in(name, &game)?;
        let outcome = game.submit_move(side, mv)?;
        if outcome.status.is_over() {
            self.settle(id, &game);
        }
        Ok(outcome)
    }

    pub fn resign(&self, name: &str) -> Result<Status, CenterError> {
        let (id, game) = self.match_of(name)?;
        let side = Self::side_in(name, &game)?;
        let status = game.resign(side)?;
        self.settle(id, &game);
        Ok(status)
    }

    pub fn request_help(&self, name: &str) -> Result<bool, CenterError> {
        let (_, game) = self.match_of(name)?;
        Ok(game.request_help()?)
    }

    pub fn acknowledge_help(&self, name: &str) -> Result<bool, CenterError> {
        let (_, game) = self.match_of(name)?;
        Ok(game.acknowledge_help())
    }

    pub fn board_view(&self, name: &str) -> Result<BoardView, CenterError> {
        let (_, game) = self.match_of(name)?;
        let side = Self::side_in(name, &game)?;
        Ok(game.board_view(side))
    }

    /// Takes `name` off their match view, resigning first if the match is
    /// still running. The match is dropped once both players have left.
    pub fn leave(&self, name: &str) -> Result<(), CenterError> {
        let (id, game) = self.match_of(name)?;
        let side = Self::side_in(name, &game)?;
        match game.resign(side) {
            Ok(_) | Err(MoveError::MatchAlreadyOver) => {}
            Err(err) => return Err(err.into()),
        }
        self.settle(id, &game);

        let mut registry = self.registry.lock();
        if let Some(state) = registry.players.get_mut(name) {
            state.current = None;
        }
        let archive = match registry.matches.get_mut(&id) {
            Some(entry) => {
                entry.left[side.index()] = true;
                entry.left.iter().all(|left| *left)
            }
            None => false,
        };
        if archive {
            registry.matches.remove(&id);
            info!("match {id} archived");
        }
        Ok(())
    }

    /// Resigns, for the side to move, every running match idle longer than
    /// the configured timeout. Returns the ids of the matches it ended.
    pub fn expire_idle(&self, now: Instant) -> Vec<MatchId> {
        let timeout = Duration::from_secs(self.config.idle_timeout_secs);
        let games: Vec<(MatchId, SharedMatch)> = {
            let registry = self.registry.lock();
            registry
                .matches
                .iter()
                .map(|(id, entry)| (*id, entry.game.clone()))
                .collect()
        };

        let mut expired = Vec::new();
        for (id, game) in games {
            let idle = {
                let current = game.read();
                (!current.status().is_over() && current.idle_for(now) >= timeout)
                    .then(|| current.turn())
            };
            let Some(side) = idle else {
                continue;
            };
            if game.resign(side).is_ok() {
                warn!("match {id} timed out; {side:?} resigned");
                self.settle(id, &game);
                expired.push(id);
            }
        }
        expired.sort_unstable();
        expired
    }

    pub fn record(&self, name: &str) -> Option<PlayerRecord> {
        self.registry
            .lock()
            .players
            .get(name)
            .map(|state| state.record.clone())
    }

    /// All records, highest first by `by`, ties broken by name.
    pub fn leaderboard(&self, by: Ranking) -> Vec<PlayerRecord> {
        let mut records: Vec<PlayerRecord> = self
            .registry
            .lock()
            .players
            .values()
            .map(|state| state.record.clone())
            .collect();
        records.sort_by(|a, b| by.key(b).cmp(&by.key(a)).then_with(|| a.name.cmp(&b.name)));
        records
    }

    /// Books an ended match into both player records, once.
    fn settle(&self, id: MatchId, game: &SharedMatch) {
        let settlement = {
            let current = game.read();
            let Some(winner) = current.status().winner() else {
                return;
            };
            Settlement {
                winner,
                players: Side::ALL.map(|side| current.player(side).to_string()),
                taken: Side::ALL.map(|side| current.captured_pieces(side).len() as u32),
            }
        };

        let mut registry = self.registry.lock();
        match registry.matches.get_mut(&id) {
            Some(entry) if !entry.recorded => entry.recorded = true,
            _ => return,
        }
        for side in Side::ALL {
            let Some(state) = registry.players.get_mut(&settlement.players[side.index()]) else {
                continue;
            };
            let record = &mut state.record;
            record.games += 1;
            if side == settlement.winner {
                record.won += 1;
            } else {
                record.lost += 1;
            }
            record.pieces_taken += settlement.taken[side.index()];
            record.pieces_lost += settlement.taken[side.opponent().index()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::RuleConfig;
    use crate::types::Square;

    fn center_with(names: &[&str]) -> GameCenter {
        let center = GameCenter::default();
        for name in names {
            center.sign_in(name).unwrap();
        }
        center
    }

    #[test]
    fn names_are_validated_and_unique() {
        let center = center_with(&["alice"]);

        assert_eq!(center.sign_in("alice"), Err(CenterError::NameTaken("alice".into())));
        assert_eq!(center.sign_in("bob!"), Err(CenterError::InvalidName("bob!".into())));
        assert_eq!(center.sign_in("   "), Err(CenterError::InvalidName("   ".into())));
        assert!(center.sign_in("bob smith").is_ok());
        assert_eq!(center.players(), vec!["alice".to_string(), "bob smith".to_string()]);
    }

    #[test]
    fn name_length_follows_the_configured_limit() {
        let center = GameCenter::default();
        let longest = "a".repeat(32);
        let too_long = "a".repeat(33);

        assert!(center.sign_in(&longest).is_ok());
        assert_eq!(center.sign_in(&too_long), Err(CenterError::InvalidName(too_long.clone())));

        let strict = GameCenter::new(CenterConfig {
            max_name_len: 5,
            ..CenterConfig::default()
        });
        assert!(strict.sign_in("alice").is_ok());
        assert_eq!(strict.sign_in("alicia"), Err(CenterError::InvalidName("alicia".into())));
    }

    #[test]
    fn challenge_requires_two_idle_players() {
        let center = center_with(&["alice", "bob", "carol"]);

        assert_eq!(center.challenge("alice", "alice").unwrap_err(), CenterError::SelfChallenge);
        assert_eq!(
            center.challenge("alice", "dave").unwrap_err(),
            CenterError::UnknownPlayer("dave".into())
        );
        let (id, game) = center.challenge("alice", "bob").unwrap();
        assert_eq!(game.read().player(Side::Red), "alice");
        assert_eq!(center.challenge("carol", "bob").unwrap_err(), CenterError::Busy("bob".into()));
        assert!(center.get(id).unwrap().ptr_eq(&game));
    }

    #[test]
    fn resignation_is_booked_once_and_archived_after_both_leave() {
        let center = center_with(&["alice", "bob"]);
        center.challenge("alice", "bob").unwrap();

        assert_eq!(center.resign("bob"), Ok(Status::Resigned { by: Side::White }));
        assert_eq!(
            center.resign("alice"),
            Err(CenterError::Move(MoveError::MatchAlreadyOver))
        );

        let alice = center.record("alice").unwrap();
        assert_eq!((alice.games, alice.won, alice.lost), (1, 1, 0));
        assert_eq!(alice.ratio(), Some(1.0));
        assert_eq!(center.record("bob").unwrap().lost, 1);

        center.leave("alice").unwrap();
        assert_eq!(center.active_matches(), 1);
        center.leave("bob").unwrap();
        assert_eq!(center.active_matches(), 0);
        assert_eq!(center.record("alice").unwrap().games, 1);
    }

    #[test]
    fn leaving_a_running_match_forfeits_it() {
        let center = center_with(&["alice", "bob"]);
        let (_, game) = center.challenge("alice", "bob").unwrap();

        center.leave("alice").unwrap();

        assert_eq!(game.status(), Status::Resigned { by: Side::Red });
        assert_eq!(center.record("bob").unwrap().won, 1);
        assert_eq!(center.match_of("alice").unwrap_err(), CenterError::NoMatch("alice".into()));
        assert!(center.challenge("alice", "bob").is_err());
    }

    #[test]
    fn moves_are_routed_to_the_callers_side() {
        let center = center_with(&["alice", "bob"]);
        center.challenge("alice", "bob").unwrap();
        let mv = Move::new(Square::new(2, 1), Square::new(3, 2));

        assert_eq!(
            center.submit_move("bob", mv),
            Err(CenterError::Move(MoveError::NotYourTurn))
        );
        let outcome = center.submit_move("alice", mv).unwrap();
        assert_eq!(outcome.status, Status::InProgress);
        assert!(center.submit_move("bob", mv).is_ok());
        assert_eq!(center.board_view("alice").unwrap().turn, Side::Red);
    }

    #[test]
    fn match_won_on_the_board_books_piece_counts() {
        let center = center_with(&["alice", "bob", "carol"]);
        let board = Board::from_diagram(
            Side::Red,
            "
            .-.-.-.-
            -.-.-.-.
            .-.-.-r-
            -.-.-w-.
            .-.-.-.-
            -.-w-.-.
            .-r-r-.-
            -.-.-r-.",
        )
        .unwrap();
        let (_, game) = center
            .open_match("alice", "bob", |red, white| {
                Match::from_position(red, white, board, Side::Red, RuleConfig::default())
            })
            .unwrap();

        let mv = |from: (u8, u8), to: (u8, u8)| {
            Move::new(Square::new(from.0, from.1), Square::new(to.0, to.1))
        };
        center.submit_move("alice", mv((1, 2), (3, 4))).unwrap();
        // White's frame: recaptures over red's landing square.
        center.submit_move("bob", mv((3, 2), (5, 4))).unwrap();
        let outcome = center.submit_move("alice", mv((1, 4), (3, 2))).unwrap();
        assert_eq!(outcome.status, Status::Ended { winner: Side::Red });

        let alice = center.record("alice").unwrap();
        let bob = center.record("bob").unwrap();
        assert_eq!(alice.pieces_taken as usize, game.captured_pieces(Side::Red).len());
        assert_eq!(bob.pieces_taken as usize, game.captured_pieces(Side::White).len());
        assert_eq!((alice.pieces_taken, alice.pieces_lost), (2, 1));
        assert_eq!(alice.pieces_lost, bob.pieces_taken);
        assert_eq!(bob.pieces_lost, alice.pieces_taken);
        assert_eq!((alice.won, bob.lost), (1, 1));

        assert_eq!(
            center.resign("bob"),
            Err(CenterError::Move(MoveError::MatchAlreadyOver))
        );
        assert_eq!(center.record("alice").unwrap(), alice);

        let by_taken: Vec<String> = center
            .leaderboard(Ranking::PiecesTaken)
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(by_taken, vec!["alice", "bob", "carol"]);
        let by_lost: Vec<String> = center
            .leaderboard(Ranking::PiecesLost)
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(by_lost, vec!["bob", "alice", "carol"]);
    }

    #[test]
    fn acknowledging_help_resets_the_idle_clock() {
        let center = center_with(&["alice", "bob"]);
        center.challenge("alice", "bob").unwrap();
        center.request_help("bob").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let acknowledged = Instant::now();
        center.acknowledge_help("alice").unwrap();

        let timeout = Duration::from_secs(center.config().idle_timeout_secs);
        let just_inside = acknowledged + timeout - Duration::from_millis(1);
        assert!(center.expire_idle(just_inside).is_empty());
    }

    #[test]
    fn idle_match_is_resigned_for_the_side_to_move() {
        let center = center_with(&["alice", "bob"]);
        let (id, game) = center.challenge("alice", "bob").unwrap();

        assert!(center.expire_idle(Instant::now()).is_empty());
        let later = Instant::now() + Duration::from_secs(601);
        assert_eq!(center.expire_idle(later), vec![id]);

        assert_eq!(game.status(), Status::Resigned { by: Side::Red });
        assert_eq!(center.record("bob").unwrap().won, 1);
        assert!(center.expire_idle(later).is_empty());
    }

    #[test]
    fn leaderboard_orders_by_requested_column() {
        let center = center_with(&["alice", "bob", "carol", "dave"]);
        center.challenge("alice", "bob").unwrap();
        center.challenge("carol", "dave").unwrap();
        center.resign("alice").unwrap();
        center.resign("dave").unwrap();

        let by_wins: Vec<String> = center
            .leaderboard(Ranking::Won)
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(by_wins, vec!["bob", "carol", "alice", "dave"]);
        assert!(center.leaderboard(Ranking::Games).iter().all(|r| r.games == 1));
    }
}
