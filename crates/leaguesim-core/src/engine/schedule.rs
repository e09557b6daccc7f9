// Double round-robin fixture generation (circle method).
//
// The first team stays fixed while the others rotate one slot per week.
// Position i meets position n-1-i. The second leg replays the first leg's
// pairings with home and away swapped. An odd field gets a bye slot whose
// pairings are dropped.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::league::fixture::NewMatch;
use crate::league::team::TeamId;

/// A scheduled pairing before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture<T> {
    pub home: T,
    pub away: T,
    /// 1-based week number.
    pub week: u32,
}

/// Number of weeks a double round-robin over `team_count` teams spans.
pub fn schedule_weeks(team_count: usize) -> u32 {
    if team_count < 2 {
        return 0;
    }
    let slots = team_count + team_count % 2;
    (2 * (slots - 1)) as u32
}

/// Generate a double round-robin schedule.
///
/// Every unordered pair of teams meets twice, once in each leg with the
/// home side swapped. Weeks run 1..=`schedule_weeks(n)` without gaps and no
/// team appears twice in the same week. Fewer than two teams yields an empty
/// schedule.
pub fn generate_schedule<T: Copy>(team_ids: &[T]) -> Vec<Fixture<T>> {
    if team_ids.len() < 2 {
        return Vec::new();
    }

    let mut rotating: Vec<Option<T>> = team_ids.iter().copied().map(Some).collect();
    if rotating.len() % 2 != 0 {
        rotating.push(None);
    }

    let slots = rotating.len();
    let rounds = slots - 1;
    let half = slots / 2;

    let mut first_leg: Vec<Vec<(T, T)>> = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        let pairs = (0..half)
            .filter_map(|i| match (rotating[i], rotating[slots - 1 - i]) {
                (Some(home), Some(away)) => Some((home, away)),
                _ => None,
            })
            .collect();
        first_leg.push(pairs);

        // Keep slot 0 fixed; the last slot moves to slot 1.
        if let Some(last) = rotating.pop() {
            rotating.insert(1, last);
        }
    }

    let mut fixtures = Vec::with_capacity(2 * first_leg.iter().map(Vec::len).sum::<usize>());
    for (round, pairs) in first_leg.iter().enumerate() {
        let week = round as u32 + 1;
        fixtures.extend(pairs.iter().map(|&(home, away)| Fixture { home, away, week }));
    }
    for (round, pairs) in first_leg.iter().enumerate() {
        let week = (rounds + round) as u32 + 1;
        fixtures.extend(pairs.iter().map(|&(home, away)| Fixture {
            home: away,
            away: home,
            week,
        }));
    }

    fixtures
}

/// Convert generated fixtures into validated insert records.
///
/// Fails if the input contained duplicate ids, which would pair a team with
/// itself.
pub fn to_new_matches(fixtures: &[Fixture<TeamId>]) -> Result<Vec<NewMatch>, LeagueError> {
    fixtures
        .iter()
        .map(|f| NewMatch::new(f.home, f.away, i64::from(f.week)))
        .collect()
}
