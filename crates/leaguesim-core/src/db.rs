// SQLite persistence layer for teams, matches and standings.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::LeagueError;
use crate::league::fixture::{Match, MatchId, NewMatch, Score};
use crate::league::standing::StandingEntry;
use crate::league::team::{NewTeam, Team, TeamId};
use crate::store::{LeagueStore, MatchFilter};

/// SQLite-backed league store.
pub struct Database {
    conn: Mutex<Connection>,
}

const MATCH_COLUMNS: &str =
    "id, home_team_id, away_team_id, week, home_score, away_score, is_played, played_at";

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name     TEXT NOT NULL UNIQUE,
                strength INTEGER NOT NULL CHECK (strength BETWEEN 1 AND 100),
                city     TEXT NOT NULL,
                logo     TEXT
            );

            CREATE TABLE IF NOT EXISTS matches (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                home_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                away_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                week         INTEGER NOT NULL CHECK (week >= 1),
                home_score   INTEGER,
                away_score   INTEGER,
                is_played    INTEGER NOT NULL DEFAULT 0,
                played_at    TEXT,
                CHECK (home_team_id <> away_team_id)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week);

            CREATE TABLE IF NOT EXISTS standings (
                team_id         INTEGER PRIMARY KEY REFERENCES teams(id) ON DELETE CASCADE,
                points          INTEGER NOT NULL DEFAULT 0,
                goals_for       INTEGER NOT NULL DEFAULT 0,
                goals_against   INTEGER NOT NULL DEFAULT 0,
                goal_difference INTEGER NOT NULL DEFAULT 0,
                wins            INTEGER NOT NULL DEFAULT 0,
                draws           INTEGER NOT NULL DEFAULT 0,
                losses          INTEGER NOT NULL DEFAULT 0,
                position        INTEGER NOT NULL DEFAULT 0
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        strength: row.get(2)?,
        city: row.get(3)?,
        logo: row.get(4)?,
    })
}

/// A `matches` row exactly as stored, before the played flag and score
/// columns are checked against each other.
struct MatchRow {
    id: MatchId,
    home_team_id: TeamId,
    away_team_id: TeamId,
    week: u32,
    home_score: Option<i64>,
    away_score: Option<i64>,
    is_played: bool,
    played_at: Option<String>,
}

impl MatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MatchRow {
            id: row.get(0)?,
            home_team_id: row.get(1)?,
            away_team_id: row.get(2)?,
            week: row.get(3)?,
            home_score: row.get(4)?,
            away_score: row.get(5)?,
            is_played: row.get(6)?,
            played_at: row.get(7)?,
        })
    }

    fn into_match(self) -> Result<Match> {
        let result = match (self.is_played, self.home_score, self.away_score) {
            (true, Some(home), Some(away)) => Some(Score::from_raw(home, away)?),
            (false, None, None) => None,
            _ => return Err(LeagueError::InconsistentMatch { match_id: self.id }.into()),
        };
        let played_at = self
            .played_at
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .with_context(|| format!("invalid played_at '{s}' on match {}", self.id))
            })
            .transpose()?;

        Ok(Match {
            id: self.id,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            week: self.week,
            result,
            played_at,
        })
    }
}

fn standing_from_row(row: &Row<'_>) -> rusqlite::Result<StandingEntry> {
    Ok(StandingEntry {
        team_id: row.get(0)?,
        points: row.get(1)?,
        goals_for: row.get(2)?,
        goals_against: row.get(3)?,
        goal_difference: row.get(4)?,
        wins: row.get(5)?,
        draws: row.get(6)?,
        losses: row.get(7)?,
        position: row.get(8)?,
    })
}

fn insert_match_row(conn: &Connection, m: &NewMatch) -> Result<Match> {
    let id: MatchId = conn
        .query_row(
            "INSERT INTO matches (home_team_id, away_team_id, week, is_played)
             VALUES (?1, ?2, ?3, 0)
             RETURNING id",
            params![m.home_team_id, m.away_team_id, m.week],
            |row| row.get(0),
        )
        .with_context(|| {
            format!(
                "failed to insert match {} vs {} in week {}",
                m.home_team_id, m.away_team_id, m.week
            )
        })?;
    Ok(Match {
        id,
        home_team_id: m.home_team_id,
        away_team_id: m.away_team_id,
        week: m.week,
        result: None,
        played_at: None,
    })
}

fn query_teams(conn: &Connection) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare("SELECT id, name, strength, city, logo FROM teams ORDER BY id")
        .context("failed to prepare load_teams query")?;
    let teams = stmt
        .query_map([], team_from_row)
        .context("failed to query teams")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map team rows")?;
    Ok(teams)
}

fn query_matches(conn: &Connection, filter: MatchFilter) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE (?1 IS NULL OR week = ?1)
           AND (?2 IS NULL OR is_played = ?2)
         ORDER BY week, id"
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare load_matches query")?;
    let rows = stmt
        .query_map(params![filter.week, filter.played], MatchRow::from_row)
        .context("failed to query matches")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map match rows")?;
    rows.into_iter().map(MatchRow::into_match).collect()
}

fn query_standings(conn: &Connection) -> Result<Vec<StandingEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT team_id, points, goals_for, goals_against, goal_difference,
                    wins, draws, losses, position
             FROM standings ORDER BY position, team_id",
        )
        .context("failed to prepare load_standings query")?;
    let entries = stmt
        .query_map([], standing_from_row)
        .context("failed to query standings")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map standing rows")?;
    Ok(entries)
}

/// Replace every standings row. Callers wrap this in a transaction.
fn write_standings(conn: &Connection, entries: &[StandingEntry]) -> Result<()> {
    conn.execute("DELETE FROM standings", [])
        .context("failed to clear standings")?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO standings (team_id, points, goals_for, goals_against,
                 goal_difference, wins, draws, losses, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .context("failed to prepare standings insert")?;
    for e in entries {
        stmt.execute(params![
            e.team_id,
            e.points,
            e.goals_for,
            e.goals_against,
            e.goal_difference,
            e.wins,
            e.draws,
            e.losses,
            e.position,
        ])
        .with_context(|| format!("failed to insert standing for team {}", e.team_id))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// LeagueStore
// ---------------------------------------------------------------------------

impl LeagueStore for Database {
    fn load_teams(&self) -> Result<Vec<Team>> {
        query_teams(&self.conn())
    }

    fn get_team(&self, id: TeamId) -> Result<Option<Team>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, strength, city, logo FROM teams WHERE id = ?1",
            params![id],
            team_from_row,
        )
        .optional()
        .with_context(|| format!("failed to load team {id}"))
    }

    fn insert_team(&self, team: &NewTeam) -> Result<Team> {
        // Validate and normalise before touching the database; the id is a
        // placeholder until SQLite assigns one.
        let mut stored = team.clone().into_team(0)?;
        let conn = self.conn();
        stored.id = conn
            .query_row(
                "INSERT INTO teams (name, strength, city, logo)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
                params![stored.name, stored.strength, stored.city, stored.logo],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to insert team '{}'", stored.name))?;
        Ok(stored)
    }

    fn update_team(&self, team: &Team) -> Result<bool> {
        team.validate()?;
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE teams SET name = ?2, strength = ?3, city = ?4, logo = ?5 WHERE id = ?1",
                params![team.id, team.name.trim(), team.strength, team.city.trim(), team.logo],
            )
            .with_context(|| format!("failed to update team {}", team.id))?;
        Ok(changed > 0)
    }

    fn delete_team(&self, id: TeamId) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute("DELETE FROM teams WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete team {id}"))?;
        Ok(changed > 0)
    }

    fn load_matches(&self, filter: MatchFilter) -> Result<Vec<Match>> {
        query_matches(&self.conn(), filter)
    }

    fn get_match(&self, id: MatchId) -> Result<Option<Match>> {
        let conn = self.conn();
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1");
        let row = conn
            .query_row(&sql, params![id], MatchRow::from_row)
            .optional()
            .with_context(|| format!("failed to load match {id}"))?;
        row.map(MatchRow::into_match).transpose()
    }

    fn insert_match(&self, m: &NewMatch) -> Result<Match> {
        let conn = self.conn();
        insert_match_row(&conn, m)
    }

    fn save_match(&self, m: &Match) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE matches
                 SET home_score = ?2, away_score = ?3, is_played = ?4, played_at = ?5
                 WHERE id = ?1",
                params![
                    m.id,
                    m.result.map(|s| s.home),
                    m.result.map(|s| s.away),
                    m.is_played(),
                    m.played_at.map(|t| t.to_rfc3339()),
                ],
            )
            .with_context(|| format!("failed to save match {}", m.id))?;
        Ok(changed > 0)
    }

    fn play_week_results<F>(&self, week: u32, mut play: F) -> Result<Vec<Match>>
    where
        F: FnMut(&mut Match) -> Result<()>,
    {
        let mut conn = self.conn();
        // IMMEDIATE takes the write lock before the read, so two connections
        // on one file cannot both see the same match as unplayed.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .with_context(|| format!("failed to begin week {week} transaction"))?;
        let pending = query_matches(&tx, MatchFilter::unplayed_in_week(week))?;

        let mut played = Vec::with_capacity(pending.len());
        for mut m in pending {
            play(&mut m)?;
            let changed = tx
                .execute(
                    "UPDATE matches
                     SET home_score = ?2, away_score = ?3, is_played = ?4, played_at = ?5
                     WHERE id = ?1 AND is_played = 0",
                    params![
                        m.id,
                        m.result.map(|s| s.home),
                        m.result.map(|s| s.away),
                        m.is_played(),
                        m.played_at.map(|t| t.to_rfc3339()),
                    ],
                )
                .with_context(|| format!("failed to save match {}", m.id))?;
            if changed > 0 {
                played.push(m);
            }
        }
        tx.commit()
            .with_context(|| format!("failed to commit week {week} results"))?;
        Ok(played)
    }

    fn delete_match(&self, id: MatchId) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute("DELETE FROM matches WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete match {id}"))?;
        Ok(changed > 0)
    }

    fn replace_schedule(&self, fixtures: &[NewMatch]) -> Result<Vec<Match>> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin schedule transaction")?;
        tx.execute("DELETE FROM matches", [])
            .context("failed to clear matches")?;
        let inserted = fixtures
            .iter()
            .map(|f| insert_match_row(&tx, f))
            .collect::<Result<Vec<_>>>()?;
        tx.commit().context("failed to commit replace_schedule")?;
        Ok(inserted)
    }

    fn reset_results(&self) -> Result<usize> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE matches
                 SET home_score = NULL, away_score = NULL, is_played = 0, played_at = NULL
                 WHERE is_played <> 0
                    OR home_score IS NOT NULL
                    OR away_score IS NOT NULL
                    OR played_at IS NOT NULL",
                [],
            )
            .context("failed to reset match results")?;
        Ok(changed)
    }

    fn max_week(&self) -> Result<u32> {
        let conn = self.conn();
        let week: u32 = conn
            .query_row("SELECT COALESCE(MAX(week), 0) FROM matches", [], |row| row.get(0))
            .context("failed to query max week")?;
        Ok(week)
    }

    fn load_standings(&self) -> Result<Vec<StandingEntry>> {
        query_standings(&self.conn())
    }

    fn save_standings(&self, entries: &[StandingEntry]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin standings transaction")?;
        write_standings(&tx, entries)?;
        tx.commit().context("failed to commit save_standings")?;
        Ok(())
    }

    fn rebuild_standings<F>(&self, compute: F) -> Result<Vec<StandingEntry>>
    where
        F: FnOnce(&[Team], &[Match], &[StandingEntry]) -> Vec<StandingEntry>,
    {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin standings transaction")?;
        let teams = query_teams(&tx)?;
        let played = query_matches(&tx, MatchFilter::played(true))?;
        let current = query_standings(&tx)?;
        let table = compute(&teams, &played, &current);
        write_standings(&tx, &table)?;
        tx.commit().context("failed to commit rebuild_standings")?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    /// Helper: a database holding teams 1..=n.
    fn seeded_db(n: usize) -> (Database, Vec<Team>) {
        let db = test_db();
        let teams = (1..=n)
            .map(|i| {
                db.insert_team(&NewTeam::new(format!("Team {i}"), 50 + i as i64, "City"))
                    .unwrap()
            })
            .collect();
        (db, teams)
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"teams".to_string()));
        assert!(tables.contains(&"matches".to_string()));
        assert!(tables.contains(&"standings".to_string()));
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    #[test]
    fn insert_and_load_teams_round_trip() {
        let db = test_db();
        let arsenal = db
            .insert_team(&NewTeam::new(" Arsenal ", 95, "London").with_logo("3.svg"))
            .unwrap();
        let chelsea = db.insert_team(&NewTeam::new("Chelsea", 92, "London")).unwrap();

        assert_eq!(arsenal.name, "Arsenal");
        assert!(chelsea.id > arsenal.id);

        let teams = db.load_teams().unwrap();
        assert_eq!(teams, vec![arsenal.clone(), chelsea]);
        assert_eq!(db.get_team(arsenal.id).unwrap(), Some(arsenal));
        assert_eq!(db.get_team(999).unwrap(), None);
    }

    #[test]
    fn duplicate_team_name_rejected() {
        let db = test_db();
        db.insert_team(&NewTeam::new("Arsenal", 95, "London")).unwrap();
        assert!(db.insert_team(&NewTeam::new("Arsenal", 80, "Elsewhere")).is_err());
    }

    #[test]
    fn invalid_team_rejected_before_insert() {
        let db = test_db();
        let err = db
            .insert_team(&NewTeam::new("Nobody", 0, "Nowhere"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LeagueError>(),
            Some(&LeagueError::InvalidStrength { strength: 0 })
        );
        assert!(db.load_teams().unwrap().is_empty());
    }

    #[test]
    fn update_team_writes_back() {
        let (db, teams) = seeded_db(1);
        let mut team = teams[0].clone();
        team.strength = 77;
        team.city = "Leeds".into();
        assert!(db.update_team(&team).unwrap());
        assert_eq!(db.get_team(team.id).unwrap(), Some(team.clone()));

        team.id = 999;
        assert!(!db.update_team(&team).unwrap());
    }

    #[test]
    fn delete_team_cascades() {
        let (db, teams) = seeded_db(3);
        db.insert_match(&NewMatch::new(teams[0].id, teams[1].id, 1).unwrap())
            .unwrap();
        db.insert_match(&NewMatch::new(teams[1].id, teams[2].id, 2).unwrap())
            .unwrap();
        db.save_standings(&[StandingEntry::zeroed(teams[0].id), StandingEntry::zeroed(teams[2].id)])
            .unwrap();

        assert!(db.delete_team(teams[0].id).unwrap());
        assert!(!db.delete_team(teams[0].id).unwrap());

        let matches = db.load_matches(MatchFilter::all()).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].involves(teams[0].id));
        let standings = db.load_standings().unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].team_id, teams[2].id);
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    #[test]
    fn foreign_keys_enforced() {
        let (db, teams) = seeded_db(1);
        let result = db.insert_match(&NewMatch::new(teams[0].id, 9999, 1).unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn load_matches_orders_and_filters() {
        let (db, teams) = seeded_db(4);
        let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        let late = db.insert_match(&NewMatch::new(ids[0], ids[1], 2).unwrap()).unwrap();
        let early = db.insert_match(&NewMatch::new(ids[2], ids[3], 1).unwrap()).unwrap();
        let mut played = db.insert_match(&NewMatch::new(ids[1], ids[0], 1).unwrap()).unwrap();
        played.set_result(Score::new(2, 0), Utc::now());
        db.save_match(&played).unwrap();

        let all: Vec<MatchId> = db
            .load_matches(MatchFilter::all())
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(all, vec![early.id, played.id, late.id]);

        let week1_unplayed = db.load_matches(MatchFilter::unplayed_in_week(1)).unwrap();
        assert_eq!(week1_unplayed.len(), 1);
        assert_eq!(week1_unplayed[0].id, early.id);

        let played_only = db.load_matches(MatchFilter::played(true)).unwrap();
        assert_eq!(played_only.len(), 1);
        assert_eq!(played_only[0].result, Some(Score::new(2, 0)));
        assert_eq!(db.max_week().unwrap(), 2);
    }

    #[test]
    fn save_match_round_trips_result_and_timestamp() {
        let (db, teams) = seeded_db(2);
        let mut m = db
            .insert_match(&NewMatch::new(teams[0].id, teams[1].id, 1).unwrap())
            .unwrap();
        let at = DateTime::parse_from_rfc3339("2026-03-01T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        m.set_result(Score::new(3, 1), at);
        assert!(db.save_match(&m).unwrap());

        let loaded = db.get_match(m.id).unwrap().unwrap();
        assert_eq!(loaded, m);

        m.clear_result();
        db.save_match(&m).unwrap();
        assert!(!db.get_match(m.id).unwrap().unwrap().is_played());
    }

    #[test]
    fn inconsistent_row_is_rejected() {
        let (db, teams) = seeded_db(2);
        let m = db
            .insert_match(&NewMatch::new(teams[0].id, teams[1].id, 1).unwrap())
            .unwrap();
        db.conn()
            .execute("UPDATE matches SET is_played = 1 WHERE id = ?1", params![m.id])
            .unwrap();

        let err = db.get_match(m.id).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LeagueError>(),
            Some(&LeagueError::InconsistentMatch { match_id: m.id })
        );
    }

    #[test]
    fn replace_schedule_swaps_all_matches() {
        let (db, teams) = seeded_db(2);
        let (a, b) = (teams[0].id, teams[1].id);
        db.insert_match(&NewMatch::new(a, b, 5).unwrap()).unwrap();

        let fixtures = vec![NewMatch::new(a, b, 1).unwrap(), NewMatch::new(b, a, 2).unwrap()];
        let inserted = db.replace_schedule(&fixtures).unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(db.load_matches(MatchFilter::all()).unwrap(), inserted);
        assert_eq!(db.max_week().unwrap(), 2);
    }

    #[test]
    fn replace_schedule_rolls_back_on_failure() {
        let (db, teams) = seeded_db(2);
        let (a, b) = (teams[0].id, teams[1].id);
        let existing = db.insert_match(&NewMatch::new(a, b, 1).unwrap()).unwrap();

        let fixtures = vec![NewMatch::new(b, a, 1).unwrap(), NewMatch::new(a, 424242, 2).unwrap()];
        assert!(db.replace_schedule(&fixtures).is_err());
        assert_eq!(db.load_matches(MatchFilter::all()).unwrap(), vec![existing]);
    }

    #[test]
    fn reset_results_clears_played_matches() {
        let (db, teams) = seeded_db(2);
        let (a, b) = (teams[0].id, teams[1].id);
        let mut m = db.insert_match(&NewMatch::new(a, b, 1).unwrap()).unwrap();
        db.insert_match(&NewMatch::new(b, a, 2).unwrap()).unwrap();
        m.set_result(Score::new(1, 1), Utc::now());
        db.save_match(&m).unwrap();

        assert_eq!(db.reset_results().unwrap(), 1);
        assert_eq!(db.reset_results().unwrap(), 0);
        let all = db.load_matches(MatchFilter::all()).unwrap();
        assert!(all.iter().all(|m| !m.is_played() && m.played_at.is_none()));
    }

    #[test]
    fn play_week_results_skips_played_matches() {
        let (db, teams) = seeded_db(4);
        let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        let mut done = db.insert_match(&NewMatch::new(ids[0], ids[1], 1).unwrap()).unwrap();
        let open = db.insert_match(&NewMatch::new(ids[2], ids[3], 1).unwrap()).unwrap();
        db.insert_match(&NewMatch::new(ids[1], ids[0], 2).unwrap()).unwrap();
        done.set_result(Score::new(2, 0), Utc::now());
        db.save_match(&done).unwrap();

        let mut seen = Vec::new();
        let played = db
            .play_week_results(1, |m| {
                seen.push(m.id);
                m.set_result(Score::new(1, 0), Utc::now());
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![open.id]);
        assert_eq!(played.len(), 1);
        assert_eq!(db.get_match(open.id).unwrap().unwrap().result, Some(Score::new(1, 0)));
        assert_eq!(db.get_match(done.id).unwrap().unwrap().result, Some(Score::new(2, 0)));
        assert_eq!(db.load_matches(MatchFilter::unplayed_in_week(2)).unwrap().len(), 1);
    }

    #[test]
    fn play_week_results_rolls_back_on_failure() {
        let (db, teams) = seeded_db(4);
        let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        db.insert_match(&NewMatch::new(ids[0], ids[1], 1).unwrap()).unwrap();
        db.insert_match(&NewMatch::new(ids[2], ids[3], 1).unwrap()).unwrap();

        let mut calls = 0;
        let result = db.play_week_results(1, |m| {
            calls += 1;
            if calls == 2 {
                return Err(LeagueError::TeamNotFound(m.away_team_id).into());
            }
            m.set_result(Score::new(3, 3), Utc::now());
            Ok(())
        });

        assert!(result.is_err());
        assert!(db.load_matches(MatchFilter::played(true)).unwrap().is_empty());
    }

    #[test]
    fn second_handle_on_same_file_cannot_replay_week() {
        let dir = std::env::temp_dir().join("leaguesim_db_test_two_handles");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("league.db");
        let path_str = path.to_str().unwrap();

        let first = Database::open(path_str).unwrap();
        let a = first.insert_team(&NewTeam::new("Arsenal", 95, "London")).unwrap();
        let b = first.insert_team(&NewTeam::new("Chelsea", 92, "London")).unwrap();
        let m = first.insert_match(&NewMatch::new(a.id, b.id, 1).unwrap()).unwrap();
        let second = Database::open(path_str).unwrap();

        let played = first
            .play_week_results(1, |m| {
                m.set_result(Score::new(2, 1), Utc::now());
                Ok(())
            })
            .unwrap();
        assert_eq!(played.len(), 1);

        let replayed = second
            .play_week_results(1, |m| {
                m.set_result(Score::new(0, 4), Utc::now());
                Ok(())
            })
            .unwrap();
        assert!(replayed.is_empty());
        assert_eq!(second.get_match(m.id).unwrap().unwrap().result, Some(Score::new(2, 1)));

        drop((first, second));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn max_week_is_zero_without_matches() {
        let db = test_db();
        assert_eq!(db.max_week().unwrap(), 0);
    }

    // ------------------------------------------------------------------
    // Standings
    // ------------------------------------------------------------------

    #[test]
    fn save_standings_replaces_table() {
        let (db, teams) = seeded_db(3);
        let mut first = StandingEntry::zeroed(teams[2].id);
        first.points = 3;
        first.wins = 1;
        first.goals_for = 2;
        first.goals_against = 1;
        first.goal_difference = 1;
        first.position = 1;
        let mut second = StandingEntry::zeroed(teams[0].id);
        second.position = 2;

        db.save_standings(&[second.clone(), first.clone()]).unwrap();
        assert_eq!(db.load_standings().unwrap(), vec![first, second.clone()]);

        db.save_standings(std::slice::from_ref(&second)).unwrap();
        assert_eq!(db.load_standings().unwrap(), vec![second]);
    }

    #[test]
    fn negative_goal_difference_survives_round_trip() {
        let (db, teams) = seeded_db(1);
        let mut entry = StandingEntry::zeroed(teams[0].id);
        entry.goals_against = 4;
        entry.goal_difference = -4;
        entry.losses = 1;
        entry.position = 1;
        db.save_standings(std::slice::from_ref(&entry)).unwrap();
        assert_eq!(db.load_standings().unwrap(), vec![entry]);
    }

    #[test]
    fn rebuild_standings_sees_played_matches_and_current_table() {
        let (db, teams) = seeded_db(2);
        let (a, b) = (teams[0].id, teams[1].id);
        let mut m = db.insert_match(&NewMatch::new(a, b, 1).unwrap()).unwrap();
        db.insert_match(&NewMatch::new(b, a, 2).unwrap()).unwrap();
        m.set_result(Score::new(1, 0), Utc::now());
        db.save_match(&m).unwrap();
        db.save_standings(&[StandingEntry::zeroed(a)]).unwrap();

        let table = db
            .rebuild_standings(|teams, played, current| {
                assert_eq!(teams.len(), 2);
                assert_eq!(played.len(), 1);
                assert_eq!(current.len(), 1);
                let mut entry = StandingEntry::zeroed(b);
                entry.position = 1;
                vec![entry]
            })
            .unwrap();

        assert_eq!(db.load_standings().unwrap(), table);
        assert_eq!(table[0].team_id, b);
    }
}
