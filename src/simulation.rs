use crate::error::{CoreError, Result};
use crate::rng::RandomSource;
use crate::types::*;
use log::{debug, warn};
use std::collections::HashMap;

/// Strength-rating driven match score simulator
#[derive(Clone, Debug, Default)]
pub struct OutcomeSimulator {
    config: SimulatorConfig,
}

impl OutcomeSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Win/draw/loss probabilities for a pairing.
    ///
    /// Home win follows a logistic curve over the adjusted rating difference
    /// and draw peaks for evenly matched teams. Under the remainder model away
    /// takes what is left; under the balanced model home and away split the
    /// non-draw mass. The triple is renormalized so it always sums to 1.
    /// Ratings are not range checked here.
    pub fn compute_probabilities(
        &self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
    ) -> Probabilities {
        let advantage = home_advantage.unwrap_or(self.config.home_advantage);
        let diff = Self::strength_difference(home_rating, away_rating, advantage) as f64;

        let logistic = 1.0 / (1.0 + (-diff / self.config.logistic_scale).exp());

        // 1.0 for even teams, 0.0 once the gap reaches 100 points
        let balance = (1.0 - diff.abs() / 100.0).clamp(0.0, 1.0);
        let draw = self.config.draw_base + balance * self.config.draw_span;

        let (home, away) = match self.config.probability_model {
            ProbabilityModel::Remainder => (logistic, (1.0 - logistic - draw).max(0.0)),
            ProbabilityModel::Balanced => {
                ((1.0 - draw) * logistic, (1.0 - draw) * (1.0 - logistic))
            }
        };

        let total = home + draw + away;
        Probabilities {
            home: home / total,
            draw: draw / total,
            away: away / total,
        }
    }

    /// Simulate one match and generate a scoreline for the sampled bucket
    pub fn simulate_score<R: RandomSource>(
        &self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
        rng: &mut R,
    ) -> SimulationOutcome {
        let advantage = home_advantage.unwrap_or(self.config.home_advantage);
        let probabilities = self.compute_probabilities(home_rating, away_rating, Some(advantage));
        let outcome = probabilities.bucket(rng.next_unit());

        let (home_score, away_score) = match outcome {
            MatchOutcome::HomeWin => {
                let winner = self.winning_goals(rng);
                (winner, rng.next_below(winner))
            }
            MatchOutcome::AwayWin => {
                let winner = self.winning_goals(rng);
                (rng.next_below(winner), winner)
            }
            MatchOutcome::Draw => {
                let shared = rng.next_below(self.config.max_draw_goals + 1);
                (shared, shared)
            }
        };

        let result = SimulationOutcome {
            home_score: home_score.min(self.config.score_cap),
            away_score: away_score.min(self.config.score_cap),
            home_win_probability: probabilities.home,
            draw_probability: probabilities.draw,
            away_win_probability: probabilities.away,
            home_advantage_applied: advantage,
            strength_difference: Self::strength_difference(home_rating, away_rating, advantage),
            outcome,
        };

        debug!(
            "simulated {} vs {} (+{}): {}-{} [{:.3}/{:.3}/{:.3}]",
            home_rating,
            away_rating,
            advantage,
            result.home_score,
            result.away_score,
            probabilities.home,
            probabilities.draw,
            probabilities.away
        );

        result
    }

    /// Neutral outcome for a fixture whose ratings are unavailable
    pub fn fallback_outcome<R: RandomSource>(&self, rng: &mut R) -> SimulationOutcome {
        let goals = self.config.fallback_max_goals + 1;
        let home_score = rng.next_below(goals);
        let away_score = rng.next_below(goals);
        let outcome = match home_score.cmp(&away_score) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
        };

        SimulationOutcome {
            home_score,
            away_score,
            home_win_probability: Probabilities::NEUTRAL.home,
            draw_probability: Probabilities::NEUTRAL.draw,
            away_win_probability: Probabilities::NEUTRAL.away,
            home_advantage_applied: self.config.home_advantage,
            strength_difference: 0,
            outcome,
        }
    }

    /// Simulate one fixture using the registry's ratings
    pub fn simulate_fixture<R: RandomSource>(
        &self,
        fixture: &Fixture,
        strengths: &HashMap<TeamId, TeamStrength>,
        rng: &mut R,
    ) -> Result<SimulationOutcome> {
        if fixture.home_team_id == fixture.away_team_id {
            return Err(CoreError::SameTeam {
                fixture_id: fixture.id,
                team_id: fixture.home_team_id,
            });
        }

        let rating = |team_id: TeamId| {
            strengths
                .get(&team_id)
                .map(|s| s.rating)
                .ok_or(CoreError::MissingRating { team_id })
        };
        let home = rating(fixture.home_team_id)?;
        let away = rating(fixture.away_team_id)?;

        Ok(self.simulate_score(home, away, None, rng))
    }

    /// Simulate a batch of fixtures.
    ///
    /// A fixture that cannot be simulated gets the neutral fallback and a
    /// failure entry; it never aborts the rest of the batch.
    pub fn simulate_fixtures<R: RandomSource>(
        &self,
        fixtures: &[Fixture],
        strengths: &HashMap<TeamId, TeamStrength>,
        rng: &mut R,
    ) -> BatchSimulation {
        let mut failures = Vec::new();

        let results = fixtures
            .iter()
            .map(|fixture| match self.simulate_fixture(fixture, strengths, rng) {
                Ok(simulation) => FixtureSimulation {
                    fixture_id: fixture.id,
                    simulation,
                    fallback: false,
                },
                Err(e) => {
                    warn!("Error simulating fixture {}: {}", fixture.id, e);
                    failures.push(FixtureFailure {
                        fixture_id: fixture.id,
                        reason: e.to_string(),
                    });
                    FixtureSimulation {
                        fixture_id: fixture.id,
                        simulation: self.fallback_outcome(rng),
                        fallback: true,
                    }
                }
            })
            .collect();

        BatchSimulation { results, failures }
    }

    /// Run the same pairing repeatedly and count the results
    pub fn simulate_trials<R: RandomSource>(
        &self,
        home_rating: i32,
        away_rating: i32,
        home_advantage: Option<i32>,
        trials: usize,
        rng: &mut R,
    ) -> OutcomeTally {
        let mut tally = OutcomeTally::default();
        for _ in 0..trials {
            tally.record(&self.simulate_score(home_rating, away_rating, home_advantage, rng));
        }
        tally
    }

    fn winning_goals<R: RandomSource>(&self, rng: &mut R) -> u32 {
        1 + rng.next_below(self.config.max_winning_goals)
    }

    fn strength_difference(home_rating: i32, away_rating: i32, home_advantage: i32) -> i64 {
        i64::from(home_rating) + i64::from(home_advantage) - i64::from(away_rating)
    }
}
