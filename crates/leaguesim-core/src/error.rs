// Engine error taxonomy.
//
// Structural problems with league input (a team scheduled against itself,
// negative scores, out-of-range ratings) are raised here. Storage failures
// are not: they travel as `anyhow::Error` from the store unchanged.

use thiserror::Error;

use crate::league::fixture::MatchId;
use crate::league::team::TeamId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeagueError {
    #[error("team {team_id} cannot play against itself")]
    SameTeam { team_id: TeamId },

    #[error("week must be a positive integer, got {week}")]
    InvalidWeek { week: i64 },

    #[error("scores must be non-negative, got {home} - {away}")]
    NegativeScore { home: i64, away: i64 },

    #[error("strength must be between 1 and 100, got {strength}")]
    InvalidStrength { strength: i64 },

    #[error("invalid team field `{field}`: {message}")]
    InvalidTeam { field: String, message: String },

    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("match {match_id} has a played flag that disagrees with its scores")]
    InconsistentMatch { match_id: MatchId },
}
