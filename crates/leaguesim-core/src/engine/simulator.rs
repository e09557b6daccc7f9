// Match outcome simulation.
//
// Goals are the number of successful chances out of a fixed number of
// scoring opportunities per side. Each chance succeeds with a probability
// derived from the attacker/defender strength gap, clamped to a band, and the
// home side's strength is scaled by a home-advantage multiplier. The result
// is capped so a large strength gap cannot produce runaway scores.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::league::fixture::Score;
use crate::league::team::Team;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable constants of the scoring model. Loaded from the `[simulation]`
/// table of simulation.toml; any key left out falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Multiplier applied to the home team's strength.
    pub home_advantage: f64,
    /// Per-chance scoring probability between equally rated sides.
    pub base_chance: f64,
    /// Probability added per 100 points of strength advantage.
    pub strength_factor: f64,
    /// Floor of the per-chance probability.
    pub min_chance: f64,
    /// Ceiling of the per-chance probability.
    pub max_chance: f64,
    /// Scoring opportunities per side per match.
    pub attempts: u32,
    /// Hard cap on goals per side.
    pub max_goals: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            home_advantage: 1.10,
            base_chance: 0.12,
            strength_factor: 0.15,
            min_chance: 0.05,
            max_chance: 0.30,
            attempts: 7,
            max_goals: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MatchSimulator {
    params: SimulationParams,
}

impl MatchSimulator {
    pub fn new(params: SimulationParams) -> Self {
        MatchSimulator { params }
    }

    /// Probability that a single chance by `attack` against `defence` is
    /// converted, clamped to `[min_chance, max_chance]`.
    pub fn scoring_chance(&self, attack: f64, defence: f64) -> f64 {
        let p = &self.params;
        let chance = p.base_chance + (attack - defence) / 100.0 * p.strength_factor;
        chance.max(p.min_chance).min(p.max_chance)
    }

    /// Simulate a match and return the final score.
    ///
    /// Neither team is modified; the caller decides whether to persist the
    /// result. All randomness comes from `rng`.
    pub fn simulate<R: Rng + ?Sized>(&self, home: &Team, away: &Team, rng: &mut R) -> Score {
        let home_strength = home.rating() * self.params.home_advantage;
        let away_strength = away.rating();

        let home_chance = self.scoring_chance(home_strength, away_strength);
        let away_chance = self.scoring_chance(away_strength, home_strength);

        let score = Score::new(
            self.count_goals(home_chance, rng),
            self.count_goals(away_chance, rng),
        );
        debug!(
            "simulated {} vs {}: {} (chances {:.3}/{:.3})",
            home.name, away.name, score, home_chance, away_chance
        );
        score
    }

    /// Run the Bernoulli trials for one side. A chance is converted when a
    /// uniform roll in 1..=100 is at most `chance * 100`.
    fn count_goals<R: Rng + ?Sized>(&self, chance: f64, rng: &mut R) -> u32 {
        let threshold = chance * 100.0;
        let goals = (0..self.params.attempts)
            .filter(|_| f64::from(rng.gen_range(1..=100u32)) <= threshold)
            .count() as u32;
        goals.min(self.params.max_goals)
    }
}
