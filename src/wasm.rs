//! JavaScript surface over one process-wide [`GameCenter`].

use once_cell::sync::OnceCell;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::center::{CenterError, GameCenter, Ranking};
use crate::config::CenterConfig;
use crate::types::Move;

static CENTER: OnceCell<GameCenter> = OnceCell::new();

fn center() -> &'static GameCenter {
    CENTER.get_or_init(GameCenter::default)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

/// Initialize panic hook for readable error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Applies `{ idleTimeoutSecs, maxNameLen, rules: { backwardCaptures } }`.
/// Only allowed before the first other call.
#[wasm_bindgen]
pub fn configure(config: JsValue) -> Result<(), JsError> {
    let config: CenterConfig = serde_wasm_bindgen::from_value(config)?;
    CENTER
        .set(GameCenter::new(config))
        .map_err(|_| JsError::new("game center is already running"))
}

#[wasm_bindgen(js_name = "signIn")]
pub fn sign_in(name: &str) -> Result<(), JsError> {
    Ok(center().sign_in(name)?)
}

#[wasm_bindgen(js_name = "signOut")]
pub fn sign_out(name: &str) -> Result<(), JsError> {
    Ok(center().sign_out(name)?)
}

#[wasm_bindgen]
pub fn players() -> Result<JsValue, JsError> {
    to_js(&center().players())
}

/// Starts a match and returns its id. The challenger plays red.
#[wasm_bindgen]
pub fn challenge(challenger: &str, opponent: &str) -> Result<u32, JsError> {
    let (id, _) = center().challenge(challenger, opponent)?;
    Ok(id)
}

/// Submits `{ from: { row, col }, to: { row, col } }` in the caller's frame.
#[wasm_bindgen(js_name = "submitMove")]
pub fn submit_move(name: &str, mv: JsValue) -> Result<JsValue, JsError> {
    let mv: Move = serde_wasm_bindgen::from_value(mv)?;
    to_js(&center().submit_move(name, mv)?)
}

#[wasm_bindgen(js_name = "boardView")]
pub fn board_view(name: &str) -> Result<JsValue, JsError> {
    to_js(&center().board_view(name)?)
}

#[wasm_bindgen(js_name = "legalMoves")]
pub fn legal_moves(name: &str) -> Result<JsValue, JsError> {
    let (_, game) = center().match_of(name)?;
    let game = game.read();
    let side = game
        .side_of(name)
        .ok_or_else(|| CenterError::NoMatch(name.to_string()))?;
    to_js(&game.legal_moves(side))
}

/// Pieces taken by the caller, oldest first.
#[wasm_bindgen(js_name = "capturedPieces")]
pub fn captured_pieces(name: &str) -> Result<JsValue, JsError> {
    let (_, game) = center().match_of(name)?;
    let game = game.read();
    let side = game
        .side_of(name)
        .ok_or_else(|| CenterError::NoMatch(name.to_string()))?;
    to_js(&game.captured_pieces(side))
}

#[wasm_bindgen]
pub fn resign(name: &str) -> Result<JsValue, JsError> {
    to_js(&center().resign(name)?)
}

#[wasm_bindgen(js_name = "requestHelp")]
pub fn request_help(name: &str) -> Result<bool, JsError> {
    Ok(center().request_help(name)?)
}

#[wasm_bindgen(js_name = "acknowledgeHelp")]
pub fn acknowledge_help(name: &str) -> Result<bool, JsError> {
    Ok(center().acknowledge_help(name)?)
}

#[wasm_bindgen]
pub fn leave(name: &str) -> Result<(), JsError> {
    Ok(center().leave(name)?)
}

#[wasm_bindgen]
pub fn record(name: &str) -> Result<JsValue, JsError> {
    to_js(&center().record(name))
}

/// `by` is one of "games", "won", "lost", "piecesTaken", "piecesLost".
#[wasm_bindgen]
pub fn leaderboard(by: JsValue) -> Result<JsValue, JsError> {
    let by: Ranking = serde_wasm_bindgen::from_value(by)?;
    to_js(&center().leaderboard(by))
}

/// Resigns idle matches; hosts call this from a timer.
#[wasm_bindgen(js_name = "expireIdle")]
pub fn expire_idle() -> Vec<u32> {
    center().expire_idle(web_time::Instant::now())
}
