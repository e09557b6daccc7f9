// Standings aggregation and ranking.
//
// Every entry is rebuilt from a full scan of the played matches. There are
// no incremental updates: a team's row is either recomputed from scratch or
// left exactly as it was.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::league::fixture::Match;
use crate::league::standing::{StandingEntry, TeamRecord};
use crate::league::team::{Team, TeamId};

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Tally a single team's played matches from that team's side.
pub fn team_record(team_id: TeamId, matches: &[Match]) -> TeamRecord {
    let mut record = TeamRecord::default();
    for m in matches {
        let Some(score) = m.result else {
            continue;
        };
        if m.home_team_id == team_id {
            record.add_result(score.home, score.away);
        } else if m.away_team_id == team_id {
            record.add_result(score.away, score.home);
        }
    }
    record
}

/// Build the full, ranked table: one entry per team, zero-valued for teams
/// that have not played yet.
pub fn compute_standings(teams: &[Team], matches: &[Match]) -> Vec<StandingEntry> {
    let mut entries: Vec<StandingEntry> = teams
        .iter()
        .map(|t| StandingEntry::from_record(t.id, &team_record(t.id, matches)))
        .collect();
    rank(&mut entries);
    entries
}

/// Replace the entries for `team_ids` with fresh full rescans, keep every
/// other entry as-is, and re-rank the whole table.
///
/// Teams in `team_ids` without an existing entry gain one.
pub fn recompute_for_teams(
    current: &[StandingEntry],
    team_ids: &[TeamId],
    matches: &[Match],
) -> Vec<StandingEntry> {
    let mut by_team: BTreeMap<TeamId, StandingEntry> = current
        .iter()
        .map(|e| (e.team_id, e.clone()))
        .collect();

    for &team_id in team_ids {
        by_team.insert(
            team_id,
            StandingEntry::from_record(team_id, &team_record(team_id, matches)),
        );
    }

    let mut entries: Vec<StandingEntry> = by_team.into_values().collect();
    rank(&mut entries);
    entries
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Table order: points, goal difference, goals scored (all descending), then
/// team id ascending so that no two teams ever compare equal.
pub fn compare_entries(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Sort entries into table order and assign positions 1..=N.
pub fn rank(entries: &mut [StandingEntry]) {
    entries.sort_by(compare_entries);
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.position = idx as u32 + 1;
    }
}
