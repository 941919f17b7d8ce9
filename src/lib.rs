pub mod error;
mod logging;
mod rng;
mod shootout;
mod simulation;
mod strength;
mod types;

pub use error::CoreError;
pub use rng::RandomSource;
pub use shootout::{flip_coin, narrate, Shootout, ShootoutResolver, ShootoutState};
pub use simulation::OutcomeSimulator;
pub use strength::{suggest_team_strengths, LeagueStrengthAnalysis};
pub use types::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_call(call: &str) -> Result<CoinSide, JsValue> {
    call.parse::<CoinSide>().map_err(js_err)
}

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

/// Change console log verbosity ("error", "warn", "info", "debug", "trace", "off")
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logging::init(logging::parse_level(level));
}

/// WASM-exposed match outcome engine
#[wasm_bindgen]
pub struct LeagueEngine {
    config: EngineConfig,
    simulator: OutcomeSimulator,
    resolver: ShootoutResolver,
    rng: StdRng,
    /// Interactive shootouts in progress
    shootouts: HashMap<u32, Shootout>,
    next_shootout_id: u32,
}

impl LeagueEngine {
    fn with_config(seed: u64, config: EngineConfig) -> Self {
        Self {
            simulator: OutcomeSimulator::new(config.simulator.clone()),
            resolver: ShootoutResolver::new(config.shootout.clone()),
            config,
            rng: StdRng::seed_from_u64(seed),
            shootouts: HashMap::new(),
            next_shootout_id: 1,
        }
    }

    /// Remove a terminated session and freeze its outcome. A session left
    /// level at the cap is settled by the cap policy; if the policy leaves it
    /// unresolved the session is dropped along with the error.
    fn close_shootout(&mut self, shootout_id: u32) -> error::Result<ShootoutOutcome> {
        let mut shootout = self
            .shootouts
            .remove(&shootout_id)
            .ok_or(CoreError::ShootoutNotFound(shootout_id))?;

        match shootout.state() {
            ShootoutState::Complete { .. } => {}
            ShootoutState::LevelAtCap => {
                shootout.settle_tiebreak(&mut self.rng)?;
            }
            ShootoutState::Regulation { .. } | ShootoutState::SuddenDeath { .. } => {
                self.shootouts.insert(shootout_id, shootout);
                return Err(CoreError::ShootoutInProgress);
            }
        }
        shootout.into_outcome()
    }
}

#[wasm_bindgen]
impl LeagueEngine {
    /// Create an engine with the default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> LeagueEngine {
        Self::with_config(seed, EngineConfig::default())
    }

    /// Create with custom config (partial JSON is merged over the defaults)
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<LeagueEngine, JsValue> {
        let config = EngineConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("Config parse error: {}", e)))?;
        Ok(Self::with_config(seed, config))
    }

    /// Get the active config as JSON
    pub fn get_config(&self) -> String {
        serde_json::to_string(&self.config).unwrap_or_default()
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&EngineConfig::default()).unwrap_or_default()
    }

    /// Win/draw/loss probabilities as JSON
    pub fn compute_probabilities(
        &self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
    ) -> String {
        let p = self
            .simulator
            .compute_probabilities(home_rating, away_rating, home_advantage);
        serde_json::to_string(&p).unwrap_or_default()
    }

    /// Simulate one match
    pub fn simulate_score(
        &mut self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
    ) -> String {
        let outcome = self
            .simulator
            .simulate_score(home_rating, away_rating, home_advantage, &mut self.rng);
        serde_json::to_string(&outcome).unwrap_or_default()
    }

    /// Simulate a round of fixtures against a strength registry
    pub fn simulate_fixtures(
        &mut self,
        fixtures_json: &str,
        strengths_json: &str,
    ) -> Result<String, JsValue> {
        let fixtures: Vec<Fixture> = serde_json::from_str(fixtures_json)
            .map_err(|e| JsValue::from_str(&format!("Fixtures parse error: {}", e)))?;
        let strengths: Vec<TeamStrength> = serde_json::from_str(strengths_json)
            .map_err(|e| JsValue::from_str(&format!("Strengths parse error: {}", e)))?;
        validate_strengths(&strengths).map_err(js_err)?;

        let registry: HashMap<TeamId, TeamStrength> =
            strengths.into_iter().map(|s| (s.team_id, s)).collect();
        let batch = self
            .simulator
            .simulate_fixtures(&fixtures, &registry, &mut self.rng);

        serde_json::to_string(&batch).map_err(js_err)
    }

    /// Simulate the same pairing `trials` times and return the tally with rates
    pub fn simulate_trials(
        &mut self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
        trials: usize,
    ) -> String {
        let tally = self.simulator.simulate_trials(
            home_rating,
            away_rating,
            home_advantage,
            trials,
            &mut self.rng,
        );
        serde_json::json!({
            "tally": tally,
            "home_win_rate": tally.home_win_rate(),
            "draw_rate": tally.draw_rate(),
            "away_win_rate": tally.away_win_rate(),
            "avg_goals_per_match": tally.avg_goals_per_match(),
        })
        .to_string()
    }

    /// Fully automatic penalty shootout
    pub fn resolve_shootout(
        &mut self,
        contestant1_id: u32,
        contestant2_id: u32,
    ) -> Result<String, JsValue> {
        let outcome = self
            .resolver
            .resolve(contestant1_id, contestant2_id, &mut self.rng)
            .map_err(js_err)?;
        let summary = outcome.summary();
        Ok(serde_json::json!({
            "outcome": outcome,
            "summary": summary,
        })
        .to_string())
    }

    /// Open an interactive shootout
    pub fn start_shootout(
        &mut self,
        contestant1_id: u32,
        contestant2_id: u32,
    ) -> Result<String, JsValue> {
        let shootout = self
            .resolver
            .start(contestant1_id, contestant2_id)
            .map_err(js_err)?;

        let shootout_id = self.next_shootout_id;
        self.next_shootout_id += 1;
        let next_turn = shootout.next_turn();
        self.shootouts.insert(shootout_id, shootout);

        Ok(serde_json::json!({
            "shootout_id": shootout_id,
            "next_turn": next_turn,
        })
        .to_string())
    }

    /// Take the next kick of an interactive shootout
    pub fn take_shootout_attempt(
        &mut self,
        shootout_id: u32,
        contestant_id: u32,
        call: &str,
    ) -> Result<String, JsValue> {
        let call = parse_call(call)?;
        let shootout = self
            .shootouts
            .get_mut(&shootout_id)
            .ok_or_else(|| js_err(CoreError::ShootoutNotFound(shootout_id)))?;

        let attempt = shootout
            .take_attempt(contestant_id, call, &mut self.rng)
            .map_err(js_err)?;

        Ok(serde_json::json!({
            "attempt": attempt,
            "progress": shootout.progress(),
            "state": shootout.state(),
        })
        .to_string())
    }

    /// Current state of an interactive shootout
    pub fn get_shootout(&self, shootout_id: u32) -> Result<String, JsValue> {
        let shootout = self
            .shootouts
            .get(&shootout_id)
            .ok_or_else(|| js_err(CoreError::ShootoutNotFound(shootout_id)))?;
        Ok(serde_json::json!({
            "shootout_id": shootout_id,
            "attempts": shootout.attempts(),
            "progress": shootout.progress(),
            "state": shootout.state(),
        })
        .to_string())
    }

    /// Close a finished interactive shootout and return its outcome.
    /// A shootout left level at the round cap is settled by the cap policy.
    pub fn finish_shootout(&mut self, shootout_id: u32) -> Result<String, JsValue> {
        let outcome = self.close_shootout(shootout_id).map_err(js_err)?;
        let summary = outcome.summary();
        Ok(serde_json::json!({
            "outcome": outcome,
            "summary": summary,
        })
        .to_string())
    }

    /// Resolve one kick against a caller-held attempt history (JSON array)
    pub fn resolve_attempt(
        &mut self,
        prior_attempts_json: &str,
        contestant_id: u32,
        round: u32,
        call: &str,
    ) -> Result<String, JsValue> {
        let prior: Vec<ShootoutAttempt> = serde_json::from_str(prior_attempts_json)
            .map_err(|e| JsValue::from_str(&format!("Attempts parse error: {}", e)))?;
        let call = parse_call(call)?;
        let attempt = self
            .resolver
            .resolve_attempt(&prior, contestant_id, round, call, &mut self.rng)
            .map_err(js_err)?;
        serde_json::to_string(&attempt).map_err(js_err)
    }

    /// Replay a caller-held attempt history and report scores and termination
    pub fn evaluate_shootout(
        &self,
        contestant1_id: u32,
        contestant2_id: u32,
        attempts_json: &str,
    ) -> Result<String, JsValue> {
        let attempts: Vec<ShootoutAttempt> = serde_json::from_str(attempts_json)
            .map_err(|e| JsValue::from_str(&format!("Attempts parse error: {}", e)))?;
        let progress = self
            .resolver
            .evaluate(contestant1_id, contestant2_id, &attempts)
            .map_err(js_err)?;
        serde_json::to_string(&progress).map_err(js_err)
    }

    /// Flip a coin (for testing or manual coin flips)
    pub fn flip_coin(&mut self) -> String {
        let result = flip_coin(&mut self.rng);
        let timestamp: String = js_sys::Date::new_0().to_iso_string().into();
        serde_json::json!({
            "result": result,
            "timestamp": timestamp,
        })
        .to_string()
    }
}

/// Suggested strength ratings for a league, keyed by team name
#[wasm_bindgen]
pub fn get_suggested_strengths(league: &str) -> String {
    serde_json::to_string(&suggest_team_strengths(league)).unwrap_or_default()
}

/// League strength spread for a list of team strengths (JSON array)
#[wasm_bindgen]
pub fn analyze_league_strength(league: &str, strengths_json: &str) -> Result<String, JsValue> {
    let teams: Vec<TeamStrength> = serde_json::from_str(strengths_json)
        .map_err(|e| JsValue::from_str(&format!("Strengths parse error: {}", e)))?;
    validate_strengths(&teams).map_err(js_err)?;

    let analysis = LeagueStrengthAnalysis::from_teams(league, &teams)
        .ok_or_else(|| JsValue::from_str("League not found or has no teams"))?;
    serde_json::to_string(&analysis).map_err(js_err)
}

/// Reject a rating outside 1-100
#[wasm_bindgen]
pub fn validate_team_strength(team_id: u32, rating: i32) -> Result<(), JsValue> {
    validate_rating(team_id, rating).map_err(js_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::scripted::ScriptedSource;
    use serde_json::Value;

    /// Play an interactive session where every kick scores
    fn level_session(engine: &LeagueEngine, kicks: usize) -> Shootout {
        let mut shootout = engine.resolver.start(1, 2).unwrap();
        let mut source = ScriptedSource::coins(&vec![CoinSide::Heads; kicks]);
        for _ in 0..kicks {
            let turn = shootout.next_turn().unwrap();
            shootout
                .take_attempt(turn.contestant_id, CoinSide::Heads, &mut source)
                .unwrap();
        }
        shootout
    }

    #[test]
    fn test_unresolved_shootout_is_dropped_on_finish() {
        let config = r#"{"shootout": {"cap_policy": "unresolved"}}"#;
        let mut engine = LeagueEngine::new_with_config(1, config).unwrap();
        let shootout = level_session(&engine, 20);
        assert_eq!(shootout.state(), ShootoutState::LevelAtCap);
        engine.shootouts.insert(4, shootout);

        assert!(matches!(
            engine.close_shootout(4),
            Err(CoreError::ShootoutUnresolved { score: 10 })
        ));
        assert!(engine.shootouts.is_empty());
        assert!(matches!(
            engine.close_shootout(4),
            Err(CoreError::ShootoutNotFound(4))
        ));
    }

    #[test]
    fn test_unfinished_shootout_stays_open() {
        let mut engine = LeagueEngine::new(1);
        let shootout = level_session(&engine, 3);
        engine.shootouts.insert(6, shootout);

        assert!(matches!(
            engine.close_shootout(6),
            Err(CoreError::ShootoutInProgress)
        ));
        assert_eq!(engine.shootouts[&6].attempts().len(), 3);
    }

    #[test]
    fn test_level_shootout_finishes_with_tiebreak() {
        let mut engine = LeagueEngine::new(1);
        let shootout = level_session(&engine, 20);
        engine.shootouts.insert(2, shootout);

        let outcome = engine.close_shootout(2).unwrap();
        assert!(outcome.tiebreak.is_some());
        assert_eq!((outcome.contestant1_score, outcome.contestant2_score), (10, 10));
        assert!(engine.shootouts.is_empty());
    }

    #[test]
    fn test_engine_simulate_score_json() {
        let mut engine = LeagueEngine::new(42);
        let json: Value = serde_json::from_str(&engine.simulate_score(95, 45, Some(5))).unwrap();
        assert!(json["home_score"].as_u64().unwrap() <= 6);
        assert_eq!(json["home_advantage_applied"], 5);
        assert_eq!(json["strength_difference"], 55);
    }

    #[test]
    fn test_same_seed_same_results() {
        let mut a = LeagueEngine::new(7);
        let mut b = LeagueEngine::new(7);
        for _ in 0..20 {
            assert_eq!(a.simulate_score(70, 65, None), b.simulate_score(70, 65, None));
        }
        assert_eq!(a.resolve_shootout(1, 2).unwrap(), b.resolve_shootout(1, 2).unwrap());
    }

    #[test]
    fn test_engine_config_override() {
        let config = r#"{"simulator": {"home_advantage": 0}}"#;
        let engine = LeagueEngine::new_with_config(1, config).unwrap();
        let p: Probabilities =
            serde_json::from_str(&engine.compute_probabilities(50, 50, None)).unwrap();
        assert!((p.home - 0.5).abs() < 1e-12);

        let config: EngineConfig =
            serde_json::from_str(&LeagueEngine::get_default_config()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_engine_batch_simulation() {
        let mut engine = LeagueEngine::new(3);
        let fixtures = r#"[
            {"id": 1, "home_team_id": 10, "away_team_id": 11},
            {"id": 2, "home_team_id": 10, "away_team_id": 12}
        ]"#;
        let strengths = r#"[{"team_id": 10, "rating": 88}, {"team_id": 11, "rating": 60}]"#;
        let batch: BatchSimulation =
            serde_json::from_str(&engine.simulate_fixtures(fixtures, strengths).unwrap()).unwrap();

        assert_eq!(batch.results.len(), 2);
        assert!(!batch.results[0].fallback);
        assert!(batch.results[1].fallback);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].fixture_id, 2);
    }

    #[test]
    fn test_engine_interactive_shootout() {
        let mut engine = LeagueEngine::new(11);
        let started: Value = serde_json::from_str(&engine.start_shootout(3, 4).unwrap()).unwrap();
        let id = started["shootout_id"].as_u64().unwrap() as u32;
        assert_eq!(started["next_turn"]["contestant_id"], 3);

        loop {
            let state: Value = serde_json::from_str(&engine.get_shootout(id).unwrap()).unwrap();
            let next = &state["progress"]["next_turn"];
            if next.is_null() {
                break;
            }
            let contestant = next["contestant_id"].as_u64().unwrap() as u32;
            engine.take_shootout_attempt(id, contestant, "heads").unwrap();
        }

        let finished: Value = serde_json::from_str(&engine.finish_shootout(id).unwrap()).unwrap();
        let outcome: ShootoutOutcome = serde_json::from_value(finished["outcome"].clone()).unwrap();
        assert!(outcome.attempts.len() <= 20);
        assert!(outcome.attempts.iter().all(|a| a.call == CoinSide::Heads));
        assert!(finished["summary"].as_str().unwrap().starts_with("Penalty shootout completed!"));
    }

    #[test]
    fn test_engine_stateless_attempts() {
        let mut engine = LeagueEngine::new(5);
        let first: ShootoutAttempt =
            serde_json::from_str(&engine.resolve_attempt("[]", 8, 1, "tails").unwrap()).unwrap();
        assert_eq!(first.sequence_number, 1);
        assert_eq!(first.call, CoinSide::Tails);

        let history = serde_json::to_string(&vec![first]).unwrap();
        let progress: ShootoutProgress =
            serde_json::from_str(&engine.evaluate_shootout(8, 9, &history).unwrap()).unwrap();
        assert_eq!(progress.total_attempts, 1);
        assert_eq!(progress.next_turn.unwrap().contestant_id, 9);
    }

    #[test]
    fn test_engine_league_helpers() {
        let suggestions: HashMap<String, i32> =
            serde_json::from_str(&get_suggested_strengths("Championship")).unwrap();
        assert_eq!(suggestions["Leeds United"], 75);

        let strengths = r#"[{"team_id": 1, "rating": 40}, {"team_id": 2, "rating": 50}]"#;
        let analysis: LeagueStrengthAnalysis =
            serde_json::from_str(&analyze_league_strength("Test", strengths).unwrap()).unwrap();
        assert_eq!(analysis.average_strength, 45.0);
        assert!(validate_team_strength(1, 50).is_ok());
    }
}
