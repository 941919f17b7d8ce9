//! Browser-side checks for the wasm facade. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use league_outcome_sim::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn flip_coin_reports_result_and_timestamp() {
    let mut engine = LeagueEngine::new(1);
    let json: serde_json::Value = serde_json::from_str(&engine.flip_coin()).unwrap();
    let result = json["result"].as_str().unwrap();
    assert!(result == "heads" || result == "tails");
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
}

#[wasm_bindgen_test]
fn invalid_inputs_surface_as_errors() {
    let mut engine = LeagueEngine::new(1);
    assert!(engine.resolve_shootout(5, 5).is_err());
    assert!(engine.take_shootout_attempt(99, 1, "heads").is_err());
    assert!(engine.resolve_attempt("[]", 1, 1, "edge").is_err());
    assert!(LeagueEngine::new_with_config(1, r#"{"shootout": {"max_rounds": 2}}"#).is_err());
    assert!(validate_team_strength(1, 0).is_err());
    assert!(analyze_league_strength("Empty", "[]").is_err());
}

#[wasm_bindgen_test]
fn interactive_shootout_rejects_out_of_turn_kicks() {
    let mut engine = LeagueEngine::new(2);
    engine.start_shootout(1, 2).unwrap();
    assert!(engine.take_shootout_attempt(1, 2, "heads").is_err());
    assert!(engine.take_shootout_attempt(1, 1, "heads").is_ok());
    assert!(engine.finish_shootout(1).is_err());
}
