// Repository boundary between the league orchestrator and persistence.
//
// The orchestrator only ever talks to this trait. `db::Database` is the
// SQLite implementation; tests can swap in anything else that satisfies it.

use anyhow::Result;

use crate::league::fixture::{Match, MatchId, NewMatch};
use crate::league::standing::StandingEntry;
use crate::league::team::{NewTeam, Team, TeamId};

/// Optional constraints for `LeagueStore::load_matches`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub week: Option<u32>,
    pub played: Option<bool>,
}

impl MatchFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn week(week: u32) -> Self {
        MatchFilter {
            week: Some(week),
            played: None,
        }
    }

    pub fn unplayed_in_week(week: u32) -> Self {
        MatchFilter {
            week: Some(week),
            played: Some(false),
        }
    }

    pub fn played(played: bool) -> Self {
        MatchFilter {
            week: None,
            played: Some(played),
        }
    }
}

/// Persistence operations the league needs.
///
/// Lookups of missing rows return `Ok(None)` or `Ok(false)`; only genuine
/// storage failures are errors.
pub trait LeagueStore {
    // --- teams ---

    /// All teams ordered by id.
    fn load_teams(&self) -> Result<Vec<Team>>;
    fn get_team(&self, id: TeamId) -> Result<Option<Team>>;
    fn insert_team(&self, team: &NewTeam) -> Result<Team>;
    /// Returns `false` when no team has `team.id`.
    fn update_team(&self, team: &Team) -> Result<bool>;
    /// Deletes the team together with its matches and standing entry.
    fn delete_team(&self, id: TeamId) -> Result<bool>;

    // --- matches ---

    /// Matches passing `filter`, ordered by week then id.
    fn load_matches(&self, filter: MatchFilter) -> Result<Vec<Match>>;
    fn get_match(&self, id: MatchId) -> Result<Option<Match>>;
    fn insert_match(&self, m: &NewMatch) -> Result<Match>;
    /// Write back result and `played_at`, overwriting any stored result.
    /// Returns `false` when the match is gone.
    fn save_match(&self, m: &Match) -> Result<bool>;
    /// Load the unplayed matches of `week` and store the result `play` sets
    /// on each, as one exclusive write. A match another writer recorded in
    /// the meantime is never overwritten. If `play` fails nothing is stored.
    ///
    /// `play` runs while the store is locked and must not call back into it.
    fn play_week_results<F>(&self, week: u32, play: F) -> Result<Vec<Match>>
    where
        F: FnMut(&mut Match) -> Result<()>;
    fn delete_match(&self, id: MatchId) -> Result<bool>;
    /// Atomically drop every match and insert `fixtures` in order.
    fn replace_schedule(&self, fixtures: &[NewMatch]) -> Result<Vec<Match>>;
    /// Mark every match unplayed. Returns how many rows changed.
    fn reset_results(&self) -> Result<usize>;
    /// Highest scheduled week, or 0 without matches.
    fn max_week(&self) -> Result<u32>;

    // --- standings ---

    /// Standing entries ordered by position, then team id.
    fn load_standings(&self) -> Result<Vec<StandingEntry>>;
    /// Atomically replace the whole standings table.
    fn save_standings(&self, entries: &[StandingEntry]) -> Result<()>;
    /// Replace the standings with `compute(teams, played matches, current
    /// entries)`, reading and writing under one exclusive lock so the table
    /// always reflects a single snapshot of the results.
    fn rebuild_standings<F>(&self, compute: F) -> Result<Vec<StandingEntry>>
    where
        F: FnOnce(&[Team], &[Match], &[StandingEntry]) -> Vec<StandingEntry>;
}

