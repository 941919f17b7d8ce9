use crate::error::{CoreError, Result};
use crate::rng::RandomSource;
use crate::types::*;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

const SCORED_PHRASES: [&str; 8] = [
    "Perfect placement! The keeper dove the wrong way.",
    "Rocket into the top corner! Unstoppable!",
    "Cool as ice, slots it down the middle.",
    "Keeper guessed right but couldn't reach it!",
    "Powerful shot finds the bottom corner.",
    "Cheeky panenka! The keeper looks foolish.",
    "Side-footed perfectly into the corner.",
    "Thunderbolt into the roof of the net!",
];

const MISSED_PHRASES: [&str; 9] = [
    "Blazed it over the bar! Pressure got to them.",
    "Keeper made a brilliant save!",
    "Hit the post! So close but no goal.",
    "Weak effort, easily saved by the keeper.",
    "Skied it into the stands! Terrible penalty.",
    "Keeper dived the right way and palmed it away.",
    "Hit the crossbar and bounced out!",
    "Scuffed the shot completely wide of the goal.",
    "Keeper stayed in the middle and caught it!",
];

/// Standalone fair coin flip
pub fn flip_coin<R: RandomSource>(rng: &mut R) -> CoinSide {
    rng.flip_coin()
}

/// Flavour text for one kick; picked at random from the pool matching the result
pub fn narrate<R: RandomSource>(
    scored: bool,
    call: CoinSide,
    outcome: CoinSide,
    rng: &mut R,
) -> String {
    let pool: &[&str] = if scored { &SCORED_PHRASES } else { &MISSED_PHRASES };
    let phrase = pool[rng.next_below(pool.len() as u32) as usize];
    format!("Guessed {}, coin showed {}. {}", call, outcome, phrase)
}

/// Take one kick: flip the coin against the contestant's call
fn kick<R: RandomSource>(
    turn: Turn,
    call: CoinSide,
    rng: &mut R,
) -> ShootoutAttempt {
    let outcome = rng.flip_coin();
    let scored = call == outcome;
    let narrative = narrate(scored, call, outcome, rng);

    trace!(
        "kick #{} (round {}) by {}: called {}, showed {}",
        turn.sequence_number,
        turn.round,
        turn.contestant_id,
        call,
        outcome
    );

    ShootoutAttempt {
        sequence_number: turn.sequence_number,
        round: turn.round,
        phase: turn.phase,
        contestant_id: turn.contestant_id,
        call,
        outcome,
        scored,
        narrative,
    }
}

fn validate_contestants(contestant1_id: ContestantId, contestant2_id: ContestantId) -> Result<()> {
    if contestant1_id == 0 || contestant2_id == 0 {
        return Err(CoreError::InvalidContestants(
            "both contestant ids are required".to_string(),
        ));
    }
    if contestant1_id == contestant2_id {
        return Err(CoreError::InvalidContestants(format!(
            "contestant {} cannot face themselves",
            contestant1_id
        )));
    }
    Ok(())
}

/// Where a shootout currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ShootoutState {
    Regulation { round: u32 },
    SuddenDeath { round: u32 },
    /// Still level after the last allowed round
    LevelAtCap,
    Complete { winner: ContestantId },
}

/// A shootout in progress.
///
/// Contestant 1 always kicks first in every round. Termination is only
/// checked once both contestants have kicked in a round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shootout {
    config: ShootoutConfig,
    contestant1_id: ContestantId,
    contestant2_id: ContestantId,
    attempts: Vec<ShootoutAttempt>,
    contestant1_score: u32,
    contestant2_score: u32,
    state: ShootoutState,
    tiebreak: Option<TiebreakToss>,
}

impl Shootout {
    pub fn new(
        config: ShootoutConfig,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
    ) -> Result<Self> {
        validate_contestants(contestant1_id, contestant2_id)?;
        Ok(Self {
            config,
            contestant1_id,
            contestant2_id,
            attempts: Vec::new(),
            contestant1_score: 0,
            contestant2_score: 0,
            state: ShootoutState::Regulation { round: 1 },
            tiebreak: None,
        })
    }

    /// Rebuild a shootout from a recorded attempt history, checking every
    /// attempt against the turn order on the way
    pub fn from_attempts(
        config: ShootoutConfig,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
        attempts: &[ShootoutAttempt],
    ) -> Result<Self> {
        let mut shootout = Self::new(config, contestant1_id, contestant2_id)?;
        for attempt in attempts {
            shootout.record(attempt.clone())?;
        }
        Ok(shootout)
    }

    pub fn contestants(&self) -> (ContestantId, ContestantId) {
        (self.contestant1_id, self.contestant2_id)
    }

    pub fn attempts(&self) -> &[ShootoutAttempt] {
        &self.attempts
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.contestant1_score, self.contestant2_score)
    }

    pub fn state(&self) -> ShootoutState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, ShootoutState::Complete { .. })
    }

    pub fn winner(&self) -> Option<ContestantId> {
        match self.state {
            ShootoutState::Complete { winner } => Some(winner),
            _ => None,
        }
    }

    /// The kick that is due next, if any
    pub fn next_turn(&self) -> Option<Turn> {
        let (round, phase) = match self.state {
            ShootoutState::Regulation { round } => (round, ShootoutPhase::Regulation),
            ShootoutState::SuddenDeath { round } => (round, ShootoutPhase::SuddenDeath),
            ShootoutState::LevelAtCap | ShootoutState::Complete { .. } => return None,
        };

        // Contestant 2 is due only once contestant 1 has kicked in this round
        let contestant_id = match self.attempts.last() {
            Some(last) if last.round == round && last.contestant_id == self.contestant1_id => {
                self.contestant2_id
            }
            _ => self.contestant1_id,
        };

        Some(Turn {
            contestant_id,
            sequence_number: self.attempts.len() as u32 + 1,
            round,
            phase,
        })
    }

    pub fn progress(&self) -> ShootoutProgress {
        ShootoutProgress {
            contestant1_score: self.contestant1_score,
            contestant2_score: self.contestant2_score,
            total_attempts: self.attempts.len() as u32,
            next_turn: self.next_turn(),
            is_complete: self.is_complete(),
            winner_contestant_id: self.winner(),
        }
    }

    /// Kick for `contestant_id` with a caller-supplied call
    pub fn take_attempt<R: RandomSource>(
        &mut self,
        contestant_id: ContestantId,
        call: CoinSide,
        rng: &mut R,
    ) -> Result<ShootoutAttempt> {
        let turn = self.expect_turn(contestant_id)?;
        let attempt = kick(turn, call, rng);
        self.record(attempt.clone())?;
        Ok(attempt)
    }

    /// Break a tie left at the round cap according to the configured policy
    pub fn settle_tiebreak<R: RandomSource>(&mut self, rng: &mut R) -> Result<ContestantId> {
        match self.state {
            ShootoutState::LevelAtCap => {}
            ShootoutState::Complete { .. } => return Err(CoreError::ShootoutComplete),
            _ => return Err(CoreError::ShootoutInProgress),
        }

        match self.config.cap_policy {
            CapPolicy::Unresolved => Err(CoreError::ShootoutUnresolved {
                score: self.contestant1_score,
            }),
            CapPolicy::DecidingToss => {
                let toss = rng.flip_coin();
                let winner = match toss {
                    CoinSide::Heads => self.contestant1_id,
                    CoinSide::Tails => self.contestant2_id,
                };
                self.tiebreak = Some(TiebreakToss {
                    toss,
                    winner_contestant_id: winner,
                });
                self.state = ShootoutState::Complete { winner };
                debug!(
                    "shootout level at {} after {} rounds, tiebreak toss {} to contestant {}",
                    self.contestant1_score, self.config.max_rounds, toss, winner
                );
                Ok(winner)
            }
        }
    }

    /// Freeze a finished shootout into its outcome
    pub fn into_outcome(self) -> Result<ShootoutOutcome> {
        let winner = match self.state {
            ShootoutState::Complete { winner } => winner,
            ShootoutState::LevelAtCap => {
                return Err(CoreError::ShootoutUnresolved {
                    score: self.contestant1_score,
                })
            }
            _ => return Err(CoreError::ShootoutInProgress),
        };

        Ok(ShootoutOutcome {
            contestant1_id: self.contestant1_id,
            contestant2_id: self.contestant2_id,
            attempts: self.attempts,
            contestant1_score: self.contestant1_score,
            contestant2_score: self.contestant2_score,
            winner_contestant_id: winner,
            tiebreak: self.tiebreak,
        })
    }

    fn expect_turn(&self, contestant_id: ContestantId) -> Result<Turn> {
        let turn = match self.state {
            ShootoutState::Complete { .. } => return Err(CoreError::ShootoutComplete),
            ShootoutState::LevelAtCap => {
                return Err(CoreError::AttemptLimitReached {
                    limit: self.config.max_attempts(),
                })
            }
            _ => self.next_turn().ok_or(CoreError::ShootoutComplete)?,
        };

        if turn.contestant_id != contestant_id {
            return Err(CoreError::OutOfTurn {
                expected: turn.contestant_id,
                found: contestant_id,
            });
        }
        Ok(turn)
    }

    fn record(&mut self, attempt: ShootoutAttempt) -> Result<()> {
        let turn = self.expect_turn(attempt.contestant_id)?;
        if attempt.round != turn.round || attempt.sequence_number != turn.sequence_number {
            return Err(CoreError::InvalidRound {
                expected: turn.round,
                found: attempt.round,
            });
        }

        let scored = attempt.call == attempt.outcome;
        let closes_round = attempt.contestant_id == self.contestant2_id;
        if scored {
            if closes_round {
                self.contestant2_score += 1;
            } else {
                self.contestant1_score += 1;
            }
        }
        self.attempts.push(attempt);

        if closes_round {
            self.close_round(turn.round);
        }
        Ok(())
    }

    fn close_round(&mut self, round: u32) {
        let (s1, s2) = (self.contestant1_score, self.contestant2_score);

        // Kicks each contestant still has in regulation; zero once in sudden death
        let remaining = self.config.regulation_rounds.saturating_sub(round);

        self.state = if s1 > s2 + remaining {
            ShootoutState::Complete {
                winner: self.contestant1_id,
            }
        } else if s2 > s1 + remaining {
            ShootoutState::Complete {
                winner: self.contestant2_id,
            }
        } else if round >= self.config.max_rounds {
            ShootoutState::LevelAtCap
        } else if round < self.config.regulation_rounds {
            ShootoutState::Regulation { round: round + 1 }
        } else {
            ShootoutState::SuddenDeath { round: round + 1 }
        };
    }
}

/// Coin-flip penalty shootout resolver
#[derive(Clone, Debug, Default)]
pub struct ShootoutResolver {
    config: ShootoutConfig,
}

impl ShootoutResolver {
    pub fn new(config: ShootoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShootoutConfig {
        &self.config
    }

    /// Open an interactive shootout
    pub fn start(
        &self,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
    ) -> Result<Shootout> {
        Shootout::new(self.config.clone(), contestant1_id, contestant2_id)
    }

    /// Fully automatic shootout: both contestants' calls are random too
    pub fn resolve<R: RandomSource>(
        &self,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
        rng: &mut R,
    ) -> Result<ShootoutOutcome> {
        self.play(contestant1_id, contestant2_id, |_, rng| rng.flip_coin(), rng)
    }

    /// Run a shootout to completion taking every call from `calls`
    pub fn resolve_with_calls<R, F>(
        &self,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
        mut calls: F,
        rng: &mut R,
    ) -> Result<ShootoutOutcome>
    where
        R: RandomSource,
        F: FnMut(&Turn) -> CoinSide,
    {
        self.play(contestant1_id, contestant2_id, |turn, _| calls(turn), rng)
    }

    /// Resolve a single kick against a caller-held attempt history.
    ///
    /// The history decides the sequence number and whose turn it is; the
    /// caller evaluates round boundaries (see [`Shootout::from_attempts`]).
    pub fn resolve_attempt<R: RandomSource>(
        &self,
        prior_attempts: &[ShootoutAttempt],
        contestant_id: ContestantId,
        round: u32,
        call: CoinSide,
        rng: &mut R,
    ) -> Result<ShootoutAttempt> {
        let sequence_number = prior_attempts.len() as u32 + 1;
        let limit = self.config.max_attempts();
        if sequence_number > limit {
            return Err(CoreError::AttemptLimitReached { limit });
        }

        let expected_round = (sequence_number + 1) / 2;
        if round != expected_round {
            return Err(CoreError::InvalidRound {
                expected: expected_round,
                found: round,
            });
        }

        match prior_attempts {
            [.., two_back, _] if two_back.contestant_id != contestant_id => {
                return Err(CoreError::OutOfTurn {
                    expected: two_back.contestant_id,
                    found: contestant_id,
                });
            }
            [only] if only.contestant_id == contestant_id => {
                return Err(CoreError::InvalidContestants(format!(
                    "contestant {} cannot kick twice in a row",
                    contestant_id
                )));
            }
            _ => {}
        }

        let phase = if round <= self.config.regulation_rounds {
            ShootoutPhase::Regulation
        } else {
            ShootoutPhase::SuddenDeath
        };
        let turn = Turn {
            contestant_id,
            sequence_number,
            round,
            phase,
        };
        Ok(kick(turn, call, rng))
    }

    /// Replay a caller-held attempt history and report where it stands
    pub fn evaluate(
        &self,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
        attempts: &[ShootoutAttempt],
    ) -> Result<ShootoutProgress> {
        Shootout::from_attempts(self.config.clone(), contestant1_id, contestant2_id, attempts)
            .map(|shootout| shootout.progress())
    }

    fn play<R, F>(
        &self,
        contestant1_id: ContestantId,
        contestant2_id: ContestantId,
        mut call: F,
        rng: &mut R,
    ) -> Result<ShootoutOutcome>
    where
        R: RandomSource,
        F: FnMut(&Turn, &mut R) -> CoinSide,
    {
        let mut shootout = self.start(contestant1_id, contestant2_id)?;

        while let Some(turn) = shootout.next_turn() {
            let side = call(&turn, &mut *rng);
            shootout.take_attempt(turn.contestant_id, side, rng)?;
        }

        if shootout.state() == ShootoutState::LevelAtCap {
            shootout.settle_tiebreak(rng)?;
        }

        let outcome = shootout.into_outcome()?;
        debug!(
            "shootout {} vs {}: {}-{} after {} kicks, winner {}",
            outcome.contestant1_id,
            outcome.contestant2_id,
            outcome.contestant1_score,
            outcome.contestant2_score,
            outcome.attempts.len(),
            outcome.winner_contestant_id
        );
        Ok(outcome)
    }
}
