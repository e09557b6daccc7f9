// Predicted final table.
//
// Results already on record up to a cut-off week are kept; every unplayed
// match after the cut-off is simulated. The projection lives only in memory.

use std::collections::HashMap;

use rand::Rng;

use super::simulator::MatchSimulator;
use super::standings::compute_standings;
use crate::error::LeagueError;
use crate::league::fixture::Match;
use crate::league::standing::StandingEntry;
use crate::league::team::{Team, TeamId};

/// Project the final standings as seen after `after_week`.
///
/// Played matches with `week <= after_week` count as recorded. Unplayed
/// matches with `week > after_week` are simulated. Everything else (played
/// results after the cut-off, unplayed matches on or before it) is left out.
/// The input slices are never modified.
pub fn predict_standings<R: Rng + ?Sized>(
    teams: &[Team],
    matches: &[Match],
    simulator: &MatchSimulator,
    after_week: u32,
    rng: &mut R,
) -> Result<Vec<StandingEntry>, LeagueError> {
    let by_id: HashMap<TeamId, &Team> = teams.iter().map(|t| (t.id, t)).collect();

    let mut projected = Vec::with_capacity(matches.len());
    for m in matches {
        if m.week <= after_week {
            if m.is_played() {
                projected.push(m.clone());
            }
            continue;
        }
        if m.is_played() {
            continue;
        }

        let home = by_id
            .get(&m.home_team_id)
            .ok_or(LeagueError::TeamNotFound(m.home_team_id))?;
        let away = by_id
            .get(&m.away_team_id)
            .ok_or(LeagueError::TeamNotFound(m.away_team_id))?;

        let mut simulated = m.clone();
        simulated.result = Some(simulator.simulate(home, away, rng));
        projected.push(simulated);
    }

    Ok(compute_standings(teams, &projected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::schedule::generate_schedule;
    use crate::league::fixture::Score;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn team(id: TeamId, strength: u32) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            strength,
            city: "City".into(),
            logo: None,
        }
    }

    fn season(teams: &[Team]) -> Vec<Match> {
        let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        generate_schedule(&ids)
            .into_iter()
            .enumerate()
            .map(|(i, f)| Match {
                id: i as i64 + 1,
                home_team_id: f.home,
                away_team_id: f.away,
                week: f.week,
                result: None,
                played_at: None,
            })
            .collect()
    }

    #[test]
    fn projection_covers_every_remaining_match() {
        let teams: Vec<Team> = (1..=4).map(|id| team(id, 70 + id as u32)).collect();
        let mut matches = season(&teams);
        for m in matches.iter_mut().filter(|m| m.week <= 2) {
            m.result = Some(Score::new(1, 0));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let table = predict_standings(&teams, &matches, &MatchSimulator::default(), 2, &mut rng).unwrap();

        assert_eq!(table.len(), 4);
        // Four teams, six weeks: every team ends with six results.
        assert!(table.iter().all(|e| e.matches_played() == 6));
        let positions: Vec<u32> = table.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let teams: Vec<Team> = (1..=4).map(|id| team(id, 80)).collect();
        let matches = season(&teams);
        let snapshot = matches.clone();

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        predict_standings(&teams, &matches, &MatchSimulator::default(), 0, &mut rng).unwrap();
        assert_eq!(matches, snapshot);
        assert!(matches.iter().all(|m| !m.is_played()));
    }

    #[test]
    fn results_after_cut_off_are_ignored() {
        let teams: Vec<Team> = (1..=2).map(|id| team(id, 50)).collect();
        let mut matches = season(&teams);
        // Week 2 already played, but the projection is "after week 2": only
        // week 1 (unplayed, before the cut-off) and week 2 matter.
        matches[1].result = Some(Score::new(3, 0));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let table = predict_standings(&teams, &matches, &MatchSimulator::default(), 2, &mut rng).unwrap();
        let winner = table.iter().find(|e| e.team_id == matches[1].home_team_id).unwrap();
        assert_eq!(winner.points, 3);
        assert_eq!(table.iter().map(StandingEntry::matches_played).sum::<u32>(), 2);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let table = predict_standings(&teams, &matches, &MatchSimulator::default(), 1, &mut rng).unwrap();
        // After week 1: week 1 unplayed is dropped, week 2 is already played
        // so it is not re-simulated and not counted.
        assert!(table.iter().all(StandingEntry::is_blank));
    }

    #[test]
    fn unknown_team_is_reported() {
        let teams = vec![team(1, 50)];
        let matches = vec![Match {
            id: 1,
            home_team_id: 1,
            away_team_id: 42,
            week: 1,
            result: None,
            played_at: None,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = predict_standings(&teams, &matches, &MatchSimulator::default(), 0, &mut rng).unwrap_err();
        assert_eq!(err, LeagueError::TeamNotFound(42));
    }

    #[test]
    fn same_seed_same_projection() {
        let teams: Vec<Team> = (1..=6).map(|id| team(id, 50 + 7 * id as u32)).collect();
        let matches = season(&teams);
        let sim = MatchSimulator::default();
        let a = predict_standings(&teams, &matches, &sim, 0, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        let b = predict_standings(&teams, &matches, &sim, 0, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
    }
}
