use crate::types::{ContestantId, FixtureId, TeamId};
use thiserror::Error;

/// Errors raised by the outcome simulator and the shootout resolver
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Team strength rating must be between 1 and 100 (team {team_id}: {rating})")]
    InvalidRating { team_id: TeamId, rating: i32 },

    #[error("Invalid contestants: {0}")]
    InvalidContestants(String),

    #[error("No strength rating available for team {team_id}")]
    MissingRating { team_id: TeamId },

    #[error("Fixture {fixture_id}: home and away teams must be different (team {team_id})")]
    SameTeam { fixture_id: FixtureId, team_id: TeamId },

    #[error("Out of turn: contestant {expected} is due, got contestant {found}")]
    OutOfTurn {
        expected: ContestantId,
        found: ContestantId,
    },

    #[error("Penalty shootout is already complete")]
    ShootoutComplete,

    #[error("Penalty shootout is still in progress")]
    ShootoutInProgress,

    #[error("Shootout {0} not found")]
    ShootoutNotFound(u32),

    #[error("Maximum penalty attempts reached ({limit})")]
    AttemptLimitReached { limit: u32 },

    #[error("Penalty shootout still level at {score}-{score} after the final round")]
    ShootoutUnresolved { score: u32 },

    #[error("Round mismatch: attempt history expects round {expected}, got {found}")]
    InvalidRound { expected: u32, found: u32 },

    #[error("Call must be \"heads\" or \"tails\", got {0:?}")]
    InvalidCall(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
