// Plain-text and JSON views of league data for the terminal.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use leaguesim_core::league::fixture::{Match, MatchId, Score};
use leaguesim_core::league::standing::StandingEntry;
use leaguesim_core::league::team::{Team, TeamId};

/// Team names by id, with a placeholder for ids that no longer resolve.
pub struct Names<'a> {
    by_id: HashMap<TeamId, &'a str>,
}

impl<'a> Names<'a> {
    pub fn new(teams: &'a [Team]) -> Self {
        Names {
            by_id: teams.iter().map(|t| (t.id, t.name.as_str())).collect(),
        }
    }

    pub fn get(&self, id: TeamId) -> &'a str {
        self.by_id.get(&id).copied().unwrap_or("?")
    }
}

// ---------------------------------------------------------------------------
// Serializable rows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TableRow<'a> {
    pub position: u32,
    pub team_id: TeamId,
    pub team: &'a str,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

#[derive(Debug, Serialize)]
pub struct FixtureRow<'a> {
    pub id: MatchId,
    pub week: u32,
    pub home: &'a str,
    pub away: &'a str,
    pub result: Option<Score>,
    pub played_at: Option<DateTime<Utc>>,
}

pub fn table_rows<'a>(entries: &[StandingEntry], names: &Names<'a>) -> Vec<TableRow<'a>> {
    entries
        .iter()
        .map(|e| TableRow {
            position: e.position,
            team_id: e.team_id,
            team: names.get(e.team_id),
            played: e.matches_played(),
            wins: e.wins,
            draws: e.draws,
            losses: e.losses,
            goals_for: e.goals_for,
            goals_against: e.goals_against,
            goal_difference: e.goal_difference,
            points: e.points,
        })
        .collect()
}

pub fn fixture_rows<'a>(matches: &[Match], names: &Names<'a>) -> Vec<FixtureRow<'a>> {
    matches
        .iter()
        .map(|m| FixtureRow {
            id: m.id,
            week: m.week,
            home: names.get(m.home_team_id),
            away: names.get(m.away_team_id),
            result: m.result,
            played_at: m.played_at,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

pub fn teams_text(teams: &[Team]) -> String {
    let width = name_width(teams.iter().map(|t| t.name.as_str()));
    let mut out = format!("{:>4}  {:<width$}  {:>8}  {}\n", "ID", "Team", "Strength", "City");
    for t in teams {
        out.push_str(&format!(
            "{:>4}  {:<width$}  {:>8}  {}\n",
            t.id, t.name, t.strength, t.city
        ));
    }
    out
}

pub fn table_text(rows: &[TableRow<'_>]) -> String {
    let width = name_width(rows.iter().map(|r| r.team));
    let mut out = format!(
        "{:>3}  {:<width$}  {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>4}\n",
        "Pos", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for r in rows {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>4}\n",
            r.position,
            r.team,
            r.played,
            r.wins,
            r.draws,
            r.losses,
            r.goals_for,
            r.goals_against,
            r.goal_difference,
            r.points
        ));
    }
    out
}

/// Fixtures grouped under "Week N" headings.
pub fn fixtures_text(rows: &[FixtureRow<'_>]) -> String {
    let mut by_week: BTreeMap<u32, Vec<&FixtureRow<'_>>> = BTreeMap::new();
    for r in rows {
        by_week.entry(r.week).or_default().push(r);
    }

    let width = name_width(rows.iter().flat_map(|r| [r.home, r.away]));
    let mut out = String::new();
    for (week, fixtures) in by_week {
        out.push_str(&format!("Week {week}\n"));
        for r in fixtures {
            let result = r
                .result
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            out.push_str(&format!(
                "  [{:>3}] {:>width$}  {:^7}  {}\n",
                r.id, r.home, result, r.away
            ));
        }
    }
    out
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|n| n.chars().count()).max().unwrap_or(0).max(4)
}
