// Standings table rows.

use serde::{Deserialize, Serialize};

use super::team::TeamId;

/// Points awarded for a win.
pub const POINTS_PER_WIN: u32 = 3;
/// Points awarded for a draw.
pub const POINTS_PER_DRAW: u32 = 1;

/// Raw per-team tallies gathered by scanning played matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamRecord {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl TeamRecord {
    /// Add one result seen from this team's side.
    pub fn add_result(&mut self, scored: u32, conceded: u32) {
        self.goals_for += scored;
        self.goals_against += conceded;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => self.wins += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
            std::cmp::Ordering::Less => self.losses += 1,
        }
    }

    pub fn points(&self) -> u32 {
        self.wins * POINTS_PER_WIN + self.draws * POINTS_PER_DRAW
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

/// One row of the league table.
///
/// A cached view over the match set: every field except `position` is
/// derived from a `TeamRecord`, and `position` from the ranking of the whole
/// table. Entries are rebuilt, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub team_id: TeamId,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    /// 1-based rank. Zero until the entry has been ranked.
    pub position: u32,
}

impl StandingEntry {
    pub fn from_record(team_id: TeamId, record: &TeamRecord) -> Self {
        StandingEntry {
            team_id,
            points: record.points(),
            goals_for: record.goals_for,
            goals_against: record.goals_against,
            goal_difference: record.goal_difference(),
            wins: record.wins,
            draws: record.draws,
            losses: record.losses,
            position: 0,
        }
    }

    /// An entry for a team with no played matches.
    pub fn zeroed(team_id: TeamId) -> Self {
        Self::from_record(team_id, &TeamRecord::default())
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// True when every derived counter is zero.
    pub fn is_blank(&self) -> bool {
        self.matches_played() == 0
            && self.points == 0
            && self.goals_for == 0
            && self.goals_against == 0
            && self.goal_difference == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tracks_results_from_own_side() {
        let mut rec = TeamRecord::default();
        rec.add_result(2, 1);
        rec.add_result(0, 0);
        rec.add_result(1, 3);

        assert_eq!(rec.wins, 1);
        assert_eq!(rec.draws, 1);
        assert_eq!(rec.losses, 1);
        assert_eq!(rec.goals_for, 3);
        assert_eq!(rec.goals_against, 4);
        assert_eq!(rec.points(), 4);
        assert_eq!(rec.goal_difference(), -1);
    }

    #[test]
    fn entry_derives_points_and_difference() {
        let rec = TeamRecord {
            wins: 2,
            draws: 1,
            losses: 0,
            goals_for: 5,
            goals_against: 2,
        };
        let entry = StandingEntry::from_record(9, &rec);
        assert_eq!(entry.points, 7);
        assert_eq!(entry.goal_difference, 3);
        assert_eq!(entry.matches_played(), 3);
        assert!(!entry.is_blank());
        assert!(StandingEntry::zeroed(9).is_blank());
    }
}
