use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TeamId = u32;
pub type ContestantId = u32;
pub type FixtureId = u32;

/// Lowest accepted team strength rating
pub const MIN_RATING: i32 = 1;
/// Highest accepted team strength rating
pub const MAX_RATING: i32 = 100;

/// Check a user-supplied rating against the 1-100 scale
pub fn validate_rating(team_id: TeamId, rating: i32) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::InvalidRating { team_id, rating });
    }
    Ok(())
}

/// Strength rating of one team, as stored by the team registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStrength {
    pub team_id: TeamId,
    pub rating: i32,
}

impl TeamStrength {
    pub fn new(team_id: TeamId, rating: i32) -> Result<Self> {
        validate_rating(team_id, rating)?;
        Ok(Self { team_id, rating })
    }
}

/// Validate a bulk strength update; the first out-of-range entry fails the whole batch
pub fn validate_strengths(updates: &[TeamStrength]) -> Result<()> {
    updates
        .iter()
        .try_for_each(|s| validate_rating(s.team_id, s.rating))
}

/// Win/draw/loss distribution for one pairing, from the home side's point of view
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Probabilities {
    /// Distribution used when a fixture cannot be simulated from ratings
    pub const NEUTRAL: Probabilities = Probabilities {
        home: 0.33,
        draw: 0.34,
        away: 0.33,
    };

    pub fn total(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Pick the outcome bucket for a uniform draw `r` in [0, 1).
    /// Buckets are contiguous: home, then draw, then away.
    pub fn bucket(&self, r: f64) -> MatchOutcome {
        if r < self.home {
            MatchOutcome::HomeWin
        } else if r < self.home + self.draw {
            MatchOutcome::Draw
        } else {
            MatchOutcome::AwayWin
        }
    }
}

/// Outcome bucket of a simulated match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

/// Result of one simulated match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub home_score: u32,
    pub away_score: u32,
    pub home_win_probability: f64,
    pub draw_probability: f64,
    pub away_win_probability: f64,
    pub home_advantage_applied: i32,
    /// Adjusted home rating minus away rating, widened so any pair of
    /// `i32` inputs fits
    pub strength_difference: i64,
    /// Bucket the scoreline was generated from
    pub outcome: MatchOutcome,
}

impl SimulationOutcome {
    pub fn probabilities(&self) -> Probabilities {
        Probabilities {
            home: self.home_win_probability,
            draw: self.draw_probability,
            away: self.away_win_probability,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.home_score == self.away_score
    }
}

/// A scheduled league fixture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
}

/// Simulated result for one fixture of a batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureSimulation {
    pub fixture_id: FixtureId,
    pub simulation: SimulationOutcome,
    /// True when the neutral fallback was used instead of the ratings
    pub fallback: bool,
}

/// Why a fixture fell back to the neutral outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureFailure {
    pub fixture_id: FixtureId,
    pub reason: String,
}

/// Batch simulation output: one result per input fixture, in input order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSimulation {
    pub results: Vec<FixtureSimulation>,
    pub failures: Vec<FixtureFailure>,
}

/// Running counts over many simulated matches
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub matches: usize,
    pub home_wins: usize,
    pub draws: usize,
    pub away_wins: usize,
    pub home_goals: u64,
    pub away_goals: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: &SimulationOutcome) {
        self.matches += 1;
        self.home_goals += u64::from(outcome.home_score);
        self.away_goals += u64::from(outcome.away_score);
        match outcome.home_score.cmp(&outcome.away_score) {
            std::cmp::Ordering::Greater => self.home_wins += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
            std::cmp::Ordering::Less => self.away_wins += 1,
        }
    }

    fn rate(&self, count: usize) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            count as f64 / self.matches as f64
        }
    }

    pub fn home_win_rate(&self) -> f64 {
        self.rate(self.home_wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    pub fn away_win_rate(&self) -> f64 {
        self.rate(self.away_wins)
    }

    pub fn avg_goals_per_match(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        (self.home_goals + self.away_goals) as f64 / self.matches as f64
    }
}

impl<'a> FromIterator<&'a SimulationOutcome> for OutcomeTally {
    fn from_iter<I: IntoIterator<Item = &'a SimulationOutcome>>(iter: I) -> Self {
        let mut tally = OutcomeTally::default();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

/// One face of the coin; used both for a contestant's call and the flip result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinSide::Heads => "heads",
            CoinSide::Tails => "tails",
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoinSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heads" => Ok(CoinSide::Heads),
            "tails" => Ok(CoinSide::Tails),
            _ => Err(CoreError::InvalidCall(s.to_string())),
        }
    }
}

/// Shootout phase an attempt belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootoutPhase {
    Regulation,
    SuddenDeath,
}

/// The next kick due in a shootout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub contestant_id: ContestantId,
    pub sequence_number: u32,
    pub round: u32,
    pub phase: ShootoutPhase,
}

/// One resolved penalty kick
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootoutAttempt {
    /// Global ordering across both phases, starting at 1
    pub sequence_number: u32,
    pub round: u32,
    pub phase: ShootoutPhase,
    pub contestant_id: ContestantId,
    pub call: CoinSide,
    pub outcome: CoinSide,
    pub scored: bool,
    pub narrative: String,
}

/// Coin toss used to separate contestants still level after the final round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakToss {
    /// Heads goes to contestant 1, tails to contestant 2
    pub toss: CoinSide,
    pub winner_contestant_id: ContestantId,
}

/// Final result of a shootout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootoutOutcome {
    pub contestant1_id: ContestantId,
    pub contestant2_id: ContestantId,
    pub attempts: Vec<ShootoutAttempt>,
    pub contestant1_score: u32,
    pub contestant2_score: u32,
    pub winner_contestant_id: ContestantId,
    /// Present only when the round cap was reached with the scores level
    pub tiebreak: Option<TiebreakToss>,
}

impl ShootoutOutcome {
    pub fn loser_contestant_id(&self) -> ContestantId {
        if self.winner_contestant_id == self.contestant1_id {
            self.contestant2_id
        } else {
            self.contestant1_id
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Penalty shootout completed! Final score: {}-{}. Winner: contestant {}",
            self.contestant1_score, self.contestant2_score, self.winner_contestant_id
        );
        if let Some(tiebreak) = &self.tiebreak {
            summary.push_str(&format!(" (tiebreak toss: {})", tiebreak.toss));
        }
        summary
    }
}

/// Snapshot of an in-progress (or finished) shootout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootoutProgress {
    pub contestant1_score: u32,
    pub contestant2_score: u32,
    pub total_attempts: u32,
    pub next_turn: Option<Turn>,
    pub is_complete: bool,
    pub winner_contestant_id: Option<ContestantId>,
}

/// How the non-draw probability mass is split between home and away
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityModel {
    /// Home takes the raw logistic value, away gets whatever is left (floored at 0)
    #[default]
    Remainder,
    /// Home and away share `1 - draw` in logistic proportion
    Balanced,
}

/// Outcome simulator parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Points added to the home rating before comparison
    pub home_advantage: i32,
    /// Logistic divisor; 15 gives ~73% home win at +15 adjusted difference
    pub logistic_scale: f64,
    /// Draw probability floor
    pub draw_base: f64,
    /// Extra draw probability for perfectly even teams
    pub draw_span: f64,
    /// Winner's goals are drawn from 1..=max_winning_goals
    pub max_winning_goals: u32,
    /// Shared draw score is drawn from 0..=max_draw_goals
    pub max_draw_goals: u32,
    /// Final clamp applied to both scores
    pub score_cap: u32,
    pub probability_model: ProbabilityModel,
    /// Fallback scores are drawn from 0..=fallback_max_goals
    pub fallback_max_goals: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            home_advantage: 5,
            logistic_scale: 15.0,
            draw_base: 0.15,
            draw_span: 0.15,
            max_winning_goals: 4,
            max_draw_goals: 3,
            score_cap: 6,
            probability_model: ProbabilityModel::Remainder,
            fallback_max_goals: 3,
        }
    }
}

/// What to do when contestants are still level after `max_rounds`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapPolicy {
    /// Settle it with one recorded coin toss; scores are left untouched
    #[default]
    DecidingToss,
    /// Report the shootout as unresolved
    Unresolved,
}

/// Shootout resolver parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootoutConfig {
    pub regulation_rounds: u32,
    /// Last round that may be played, sudden death included
    pub max_rounds: u32,
    pub cap_policy: CapPolicy,
}

impl Default for ShootoutConfig {
    fn default() -> Self {
        Self {
            regulation_rounds: 5,
            max_rounds: 10,
            cap_policy: CapPolicy::DecidingToss,
        }
    }
}

impl ShootoutConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_rounds * 2
    }
}

/// Full engine configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub simulator: SimulatorConfig,
    pub shootout: ShootoutConfig,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulator;
        if !(sim.logistic_scale.is_finite() && sim.logistic_scale > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "logistic_scale must be positive, got {}",
                sim.logistic_scale
            )));
        }
        if sim.draw_base < 0.0 || sim.draw_span < 0.0 || sim.draw_base + sim.draw_span > 1.0 {
            return Err(CoreError::InvalidConfig(
                "draw_base and draw_span must be non-negative and sum to at most 1".to_string(),
            ));
        }
        if sim.max_winning_goals == 0 {
            return Err(CoreError::InvalidConfig(
                "max_winning_goals must be at least 1".to_string(),
            ));
        }

        let shootout = &self.shootout;
        if shootout.regulation_rounds == 0 {
            return Err(CoreError::InvalidConfig(
                "regulation_rounds must be at least 1".to_string(),
            ));
        }
        if shootout.max_rounds < shootout.regulation_rounds {
            return Err(CoreError::InvalidConfig(format!(
                "max_rounds ({}) cannot be below regulation_rounds ({})",
                shootout.max_rounds, shootout.regulation_rounds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(TeamStrength::new(1, 1).is_ok());
        assert!(TeamStrength::new(1, 100).is_ok());
        assert!(matches!(
            TeamStrength::new(7, 0),
            Err(CoreError::InvalidRating { team_id: 7, rating: 0 })
        ));
        assert!(TeamStrength::new(7, 101).is_err());
    }

    #[test]
    fn test_bulk_validation_reports_first_bad_entry() {
        let updates = vec![
            TeamStrength { team_id: 1, rating: 80 },
            TeamStrength { team_id: 2, rating: 120 },
            TeamStrength { team_id: 3, rating: -4 },
        ];
        match validate_strengths(&updates) {
            Err(CoreError::InvalidRating { team_id, rating }) => {
                assert_eq!(team_id, 2);
                assert_eq!(rating, 120);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bucket_partition_order() {
        let p = Probabilities { home: 0.5, draw: 0.2, away: 0.3 };
        assert_eq!(p.bucket(0.0), MatchOutcome::HomeWin);
        assert_eq!(p.bucket(0.49), MatchOutcome::HomeWin);
        assert_eq!(p.bucket(0.5), MatchOutcome::Draw);
        assert_eq!(p.bucket(0.69), MatchOutcome::Draw);
        assert_eq!(p.bucket(0.7), MatchOutcome::AwayWin);
        assert_eq!(p.bucket(0.999), MatchOutcome::AwayWin);
    }

    #[test]
    fn test_coin_side_parsing() {
        assert_eq!("heads".parse::<CoinSide>().unwrap(), CoinSide::Heads);
        assert_eq!(" Tails ".parse::<CoinSide>().unwrap(), CoinSide::Tails);
        assert!("edge".parse::<CoinSide>().is_err());
        assert_eq!(serde_json::to_string(&CoinSide::Heads).unwrap(), "\"heads\"");
    }

    #[test]
    fn test_partial_config_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"simulator": {"home_advantage": 0}}"#).unwrap();
        assert_eq!(config.simulator.home_advantage, 0);
        assert_eq!(config.simulator.logistic_scale, 15.0);
        assert_eq!(config.shootout, ShootoutConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.shootout.max_rounds = 3;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.simulator.logistic_scale = 0.0;
        assert!(config.validate().is_err());

        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_tally_rates() {
        let make = |home_score, away_score| SimulationOutcome {
            home_score,
            away_score,
            home_win_probability: 0.4,
            draw_probability: 0.3,
            away_win_probability: 0.3,
            home_advantage_applied: 5,
            strength_difference: 5,
            outcome: MatchOutcome::Draw,
        };
        let outcomes = vec![make(2, 1), make(1, 1), make(0, 3), make(4, 0)];
        let tally: OutcomeTally = outcomes.iter().collect();

        assert_eq!(tally.matches, 4);
        assert_eq!(tally.home_wins, 2);
        assert_eq!(tally.draws, 1);
        assert_eq!(tally.away_wins, 1);
        assert!((tally.home_win_rate() - 0.5).abs() < 1e-12);
        assert!((tally.avg_goals_per_match() - 3.0).abs() < 1e-12);
        assert_eq!(OutcomeTally::default().draw_rate(), 0.0);
    }
}
