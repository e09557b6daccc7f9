// Match records: scheduled fixtures with or without a result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::team::TeamId;
use crate::error::LeagueError;

/// Store-assigned match identifier (SQLite rowid).
pub type MatchId = i64;

/// Final score of a played match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Score { home, away }
    }

    /// Build a score from untrusted integers (API input, database columns).
    pub fn from_raw(home: i64, away: i64) -> Result<Self, LeagueError> {
        if home < 0 || away < 0 {
            return Err(LeagueError::NegativeScore { home, away });
        }
        Ok(Score {
            home: u32::try_from(home).map_err(|_| LeagueError::NegativeScore { home, away })?,
            away: u32::try_from(away).map_err(|_| LeagueError::NegativeScore { home, away })?,
        })
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

/// Lifecycle of a single match.
///
/// `Unplayed -> Played` under normal play; an explicit reset moves a match
/// back to `Unplayed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Unplayed,
    Played,
}

/// A scheduled pairing of two teams in a given week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// 1-based week number.
    pub week: u32,
    /// `None` until the match is played.
    pub result: Option<Score>,
    /// When the result was recorded.
    pub played_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn status(&self) -> MatchStatus {
        if self.result.is_some() {
            MatchStatus::Played
        } else {
            MatchStatus::Unplayed
        }
    }

    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// The winning team, or `None` for a draw or an unplayed match.
    pub fn winner(&self) -> Option<TeamId> {
        let score = self.result?;
        if score.home > score.away {
            Some(self.home_team_id)
        } else if score.away > score.home {
            Some(self.away_team_id)
        } else {
            None
        }
    }

    pub fn is_draw(&self) -> bool {
        self.result.is_some_and(|s| s.home == s.away)
    }

    /// Human-readable result, e.g. `"2 - 1"`.
    pub fn result_string(&self) -> String {
        match self.result {
            Some(score) => score.to_string(),
            None => "Not played yet".to_string(),
        }
    }

    /// Record a result. Only valid for unplayed matches when driven by the
    /// simulator; manual edits overwrite through `set_result`.
    pub fn set_result(&mut self, score: Score, at: DateTime<Utc>) {
        self.result = Some(score);
        self.played_at = Some(at);
    }

    /// Move the match back to `Unplayed`.
    pub fn clear_result(&mut self) {
        self.result = None;
        self.played_at = None;
    }
}

/// A match that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub week: u32,
}

impl NewMatch {
    /// Validate a fixture at creation time. Home and away must differ and the
    /// week must be at least 1.
    pub fn new(home_team_id: TeamId, away_team_id: TeamId, week: i64) -> Result<Self, LeagueError> {
        if home_team_id == away_team_id {
            return Err(LeagueError::SameTeam {
                team_id: home_team_id,
            });
        }
        if week < 1 || week > i64::from(u32::MAX) {
            return Err(LeagueError::InvalidWeek { week });
        }
        Ok(NewMatch {
            home_team_id,
            away_team_id,
            week: week as u32,
        })
    }
}
