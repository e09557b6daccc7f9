// League orchestration: playing weeks, resetting, regenerating the schedule
// and keeping the standings table in step with every match edit.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::engine::prediction;
use crate::engine::schedule::{generate_schedule, to_new_matches};
use crate::engine::simulator::MatchSimulator;
use crate::engine::standings::{compute_standings, recompute_for_teams};
use crate::error::LeagueError;
use crate::league::fixture::{Match, MatchId, NewMatch, Score};
use crate::league::standing::StandingEntry;
use crate::league::team::{NewTeam, Team, TeamId};
use crate::store::{LeagueStore, MatchFilter};

/// Drives a season over a `LeagueStore`.
///
/// Every mutating operation takes `write_lock` for its whole duration, so
/// concurrent callers sharing one `League` never interleave their writes.
/// Read-only queries go straight to the store.
pub struct League<S: LeagueStore> {
    store: S,
    simulator: MatchSimulator,
    write_lock: Mutex<()>,
}

impl<S: LeagueStore> League<S> {
    pub fn new(store: S, simulator: MatchSimulator) -> Self {
        League {
            store,
            simulator,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("league mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    /// Insert `seeds` when the store holds no teams. Returns the inserted
    /// teams (empty when teams already existed).
    pub fn seed_teams(&self, seeds: &[NewTeam]) -> Result<Vec<Team>> {
        let _guard = self.lock();
        if !self.store.load_teams()?.is_empty() {
            return Ok(Vec::new());
        }
        let inserted = seeds
            .iter()
            .map(|t| self.store.insert_team(t))
            .collect::<Result<Vec<_>>>()?;
        self.refresh_standings()?;
        info!("Seeded {} teams", inserted.len());
        Ok(inserted)
    }

    /// Generate the schedule if no match exists yet. Returns whether a
    /// schedule was generated.
    pub fn ensure_schedule(&self) -> Result<bool> {
        let _guard = self.lock();
        if self.store.max_week()? > 0 {
            return Ok(false);
        }
        let created = self.regenerate_locked()?;
        Ok(!created.is_empty())
    }

    // ------------------------------------------------------------------
    // Playing
    // ------------------------------------------------------------------

    /// Simulate every unplayed match of `week`, persist the results and
    /// refresh the standings. Returns the matches played by this call.
    ///
    /// The week is stored all or nothing. A week with nothing left to play
    /// (or no matches at all) is a no-op.
    pub fn play_week<R: Rng + ?Sized>(&self, week: u32, rng: &mut R) -> Result<Vec<Match>> {
        let _guard = self.lock();
        let teams = self.team_index()?;
        let played = self.play_week_locked(week, &teams, rng)?;
        self.refresh_standings()?;
        Ok(played)
    }

    /// Play weeks 1..=max in ascending order. Results already on record are
    /// left untouched. If a week fails, the weeks before it stay played and
    /// the standings still reflect them.
    pub fn play_all<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Match>> {
        let _guard = self.lock();
        let teams = self.team_index()?;
        let max_week = self.store.max_week()?;

        let mut played = Vec::new();
        let outcome = (1..=max_week).try_for_each(|week| {
            played.extend(self.play_week_locked(week, &teams, rng)?);
            Ok::<_, anyhow::Error>(())
        });
        self.refresh_standings()?;
        outcome?;
        info!("Played {} matches across {} weeks", played.len(), max_week);
        Ok(played)
    }

    fn play_week_locked<R: Rng + ?Sized>(
        &self,
        week: u32,
        teams: &HashMap<TeamId, Team>,
        rng: &mut R,
    ) -> Result<Vec<Match>> {
        let played = self
            .store
            .play_week_results(week, |m| {
                let home = teams
                    .get(&m.home_team_id)
                    .ok_or(LeagueError::TeamNotFound(m.home_team_id))?;
                let away = teams
                    .get(&m.away_team_id)
                    .ok_or(LeagueError::TeamNotFound(m.away_team_id))?;
                let score = self.simulator.simulate(home, away, rng);
                m.set_result(score, Utc::now());
                Ok(())
            })
            .with_context(|| format!("failed to play week {week}"))?;

        if played.is_empty() {
            debug!("Week {} has no unplayed matches", week);
        } else {
            info!("Week {}: played {} matches", week, played.len());
        }
        Ok(played)
    }

    // ------------------------------------------------------------------
    // Season lifecycle
    // ------------------------------------------------------------------

    /// Return every match to unplayed and zero the table. Idempotent.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock();
        let cleared = self.store.reset_results()?;
        self.refresh_standings()?;
        info!("Reset league: {} results cleared", cleared);
        Ok(())
    }

    /// Drop every match and build a fresh double round-robin over the
    /// current teams (ordered by id).
    pub fn regenerate_schedule(&self) -> Result<Vec<Match>> {
        let _guard = self.lock();
        self.regenerate_locked()
    }

    fn regenerate_locked(&self) -> Result<Vec<Match>> {
        let teams = self.store.load_teams()?;
        let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        let fixtures = to_new_matches(&generate_schedule(&ids))?;
        let created = self.store.replace_schedule(&fixtures)?;
        self.refresh_standings()?;
        info!(
            "Generated schedule: {} matches for {} teams",
            created.len(),
            teams.len()
        );
        Ok(created)
    }

    // ------------------------------------------------------------------
    // Standings maintenance
    // ------------------------------------------------------------------

    /// Recompute every team's entry from the played matches.
    pub fn update_standings(&self) -> Result<Vec<StandingEntry>> {
        let _guard = self.lock();
        self.refresh_standings()
    }

    /// Recompute the entries of the two teams in `m` and re-rank.
    pub fn update_standings_for_match(&self, m: &Match) -> Result<Vec<StandingEntry>> {
        let _guard = self.lock();
        self.refresh_for_teams(&[m.home_team_id, m.away_team_id])
    }

    fn refresh_standings(&self) -> Result<Vec<StandingEntry>> {
        self.store
            .rebuild_standings(|teams, played, _| compute_standings(teams, played))
    }

    fn refresh_for_teams(&self, team_ids: &[TeamId]) -> Result<Vec<StandingEntry>> {
        self.store.rebuild_standings(|_, played, current| {
            recompute_for_teams(current, team_ids, played)
        })
    }

    // ------------------------------------------------------------------
    // Team edits
    // ------------------------------------------------------------------

    pub fn add_team(&self, team: &NewTeam) -> Result<Team> {
        let _guard = self.lock();
        let stored = self.store.insert_team(team)?;
        self.refresh_standings()?;
        info!("Added team {} ({})", stored.name, stored.id);
        Ok(stored)
    }

    /// Write back an edited team. Results are not affected.
    pub fn edit_team(&self, team: &Team) -> Result<Team> {
        let _guard = self.lock();
        if !self.store.update_team(team)? {
            return Err(LeagueError::TeamNotFound(team.id).into());
        }
        self.store
            .get_team(team.id)?
            .ok_or_else(|| LeagueError::TeamNotFound(team.id).into())
    }

    /// Delete a team with its matches, then rebuild the table.
    pub fn remove_team(&self, id: TeamId) -> Result<()> {
        let _guard = self.lock();
        if !self.store.delete_team(id)? {
            return Err(LeagueError::TeamNotFound(id).into());
        }
        self.refresh_standings()?;
        info!("Removed team {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Match edits
    // ------------------------------------------------------------------

    /// Schedule an extra, unplayed match.
    pub fn add_match(&self, home_team_id: TeamId, away_team_id: TeamId, week: i64) -> Result<Match> {
        let fixture = NewMatch::new(home_team_id, away_team_id, week)?;
        let _guard = self.lock();
        for id in [home_team_id, away_team_id] {
            if self.store.get_team(id)?.is_none() {
                return Err(LeagueError::TeamNotFound(id).into());
            }
        }
        self.store.insert_match(&fixture)
    }

    /// Enter or overwrite a result by hand, then refresh both teams' rows.
    pub fn record_result(&self, id: MatchId, home_score: i64, away_score: i64) -> Result<Match> {
        let score = Score::from_raw(home_score, away_score)?;
        let _guard = self.lock();
        let mut m = self
            .store
            .get_match(id)?
            .ok_or(LeagueError::MatchNotFound(id))?;
        m.set_result(score, Utc::now());
        self.store.save_match(&m)?;
        self.refresh_for_teams(&[m.home_team_id, m.away_team_id])?;
        info!("Match {} result set to {}", id, score);
        Ok(m)
    }

    /// Delete a match. Both teams are rescanned so nothing of its result
    /// lingers in the table.
    pub fn remove_match(&self, id: MatchId) -> Result<Match> {
        let _guard = self.lock();
        let m = self
            .store
            .get_match(id)?
            .ok_or(LeagueError::MatchNotFound(id))?;
        self.store.delete_match(id)?;
        self.refresh_for_teams(&[m.home_team_id, m.away_team_id])?;
        info!("Removed match {}", id);
        Ok(m)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn teams(&self) -> Result<Vec<Team>> {
        self.store.load_teams()
    }

    pub fn team(&self, id: TeamId) -> Result<Option<Team>> {
        self.store.get_team(id)
    }

    pub fn fixtures(&self, filter: MatchFilter) -> Result<Vec<Match>> {
        self.store.load_matches(filter)
    }

    /// All matches grouped by week, weeks ascending.
    pub fn fixtures_by_week(&self) -> Result<BTreeMap<u32, Vec<Match>>> {
        let mut weeks: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in self.store.load_matches(MatchFilter::all())? {
            weeks.entry(m.week).or_default().push(m);
        }
        Ok(weeks)
    }

    pub fn standings(&self) -> Result<Vec<StandingEntry>> {
        self.store.load_standings()
    }

    pub fn max_week(&self) -> Result<u32> {
        self.store.max_week()
    }

    /// Projected final table: results through `after_week` plus simulated
    /// results for every unplayed match after it. Nothing is stored.
    pub fn predict_standings<R: Rng + ?Sized>(
        &self,
        after_week: u32,
        rng: &mut R,
    ) -> Result<Vec<StandingEntry>> {
        let teams = self.store.load_teams()?;
        let matches = self.store.load_matches(MatchFilter::all())?;
        let table = prediction::predict_standings(&teams, &matches, &self.simulator, after_week, rng)?;
        Ok(table)
    }

    /// The table leader once every scheduled match has been played.
    pub fn champion(&self) -> Result<Option<StandingEntry>> {
        if self.store.max_week()? == 0 {
            return Ok(None);
        }
        if !self.store.load_matches(MatchFilter::played(false))?.is_empty() {
            return Ok(None);
        }
        let leader = self
            .store
            .load_standings()?
            .into_iter()
            .find(|e| e.position == 1);
        if leader.is_none() {
            warn!("Season complete but standings have no leader");
        }
        Ok(leader)
    }

    fn team_index(&self) -> Result<HashMap<TeamId, Team>> {
        Ok(self
            .store
            .load_teams()?
            .into_iter()
            .map(|t| (t.id, t))
            .collect())
    }
}
