#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use checkers::wasm;
use checkers::{Move, Square};

fn js_move(from: (u8, u8), to: (u8, u8)) -> wasm_bindgen::JsValue {
    let mv = Move::new(Square::new(from.0, from.1), Square::new(to.0, to.1));
    serde_wasm_bindgen::to_value(&mv).unwrap()
}

#[wasm_bindgen_test]
fn ready() {
    assert!(checkers::wasm_ready());
}

#[wasm_bindgen_test]
fn sign_in_and_list_players() {
    wasm::sign_in("ann").unwrap();
    assert!(wasm::sign_in("ann").is_err());
    assert!(wasm::sign_in("bad-name").is_err());

    let players = wasm::players().unwrap();
    assert!(js_sys::Array::is_array(&players));
}

#[wasm_bindgen_test]
fn play_a_move_through_the_facade() {
    wasm::sign_in("carl").unwrap();
    wasm::sign_in("dina").unwrap();
    wasm::challenge("carl", "dina").unwrap();

    assert!(wasm::submit_move("dina", js_move((2, 1), (3, 2))).is_err());
    let outcome = wasm::submit_move("carl", js_move((2, 1), (3, 2))).unwrap();
    assert!(outcome.is_object());

    let moves = wasm::legal_moves("dina").unwrap();
    let arr = js_sys::Array::from(&moves);
    assert!(arr.length() > 0);

    let view = wasm::board_view("dina").unwrap();
    assert!(view.is_object());
}

#[wasm_bindgen_test]
fn help_blocks_until_acknowledged() {
    wasm::sign_in("eve").unwrap();
    wasm::sign_in("finn").unwrap();
    wasm::challenge("eve", "finn").unwrap();

    assert!(wasm::request_help("finn").unwrap());
    assert!(wasm::submit_move("eve", js_move((2, 1), (3, 2))).is_err());
    assert!(wasm::acknowledge_help("eve").unwrap());
    assert!(wasm::submit_move("eve", js_move((2, 1), (3, 2))).is_ok());
}

#[wasm_bindgen_test]
fn resign_and_leave_update_records() {
    wasm::sign_in("gus").unwrap();
    wasm::sign_in("hana").unwrap();
    wasm::challenge("gus", "hana").unwrap();

    assert!(wasm::resign("gus").is_ok());
    assert!(wasm::resign("gus").is_err());
    wasm::leave("gus").unwrap();
    wasm::leave("hana").unwrap();

    let record = wasm::record("hana").unwrap();
    assert!(record.is_object());
    let board = wasm::leaderboard(wasm_bindgen::JsValue::from_str("won")).unwrap();
    assert!(js_sys::Array::is_array(&board));
}
