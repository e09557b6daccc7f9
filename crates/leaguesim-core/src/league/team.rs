// Team registry records.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;

/// Store-assigned team identifier (SQLite rowid).
pub type TeamId = i64;

/// Allowed range for a team's strength rating ("power level").
pub const STRENGTH_RANGE: RangeInclusive<i64> = 1..=100;

/// A team participating in the league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Display name. Unique across the league.
    pub name: String,
    /// Strength rating in `STRENGTH_RANGE`. Drives simulated scoring chances.
    pub strength: u32,
    pub city: String,
    /// Optional logo reference (URL or asset path).
    #[serde(default)]
    pub logo: Option<String>,
}

/// A team that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub strength: i64,
    pub city: String,
    #[serde(default)]
    pub logo: Option<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, strength: i64, city: impl Into<String>) -> Self {
        NewTeam {
            name: name.into(),
            strength,
            city: city.into(),
            logo: None,
        }
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    /// Check the record before it reaches the store.
    ///
    /// Name and city are trimmed; a blank value is rejected. The strength
    /// rating must fall within `STRENGTH_RANGE`.
    pub fn validate(&self) -> Result<(), LeagueError> {
        validate_fields(&self.name, &self.city, self.strength)
    }

    /// Convert to a stored `Team` once the store has assigned an id.
    pub fn into_team(self, id: TeamId) -> Result<Team, LeagueError> {
        self.validate()?;
        Ok(Team {
            id,
            name: self.name.trim().to_string(),
            strength: self.strength as u32,
            city: self.city.trim().to_string(),
            logo: self.logo.filter(|l| !l.trim().is_empty()),
        })
    }
}

impl Team {
    /// Validate an edited team before it is written back.
    pub fn validate(&self) -> Result<(), LeagueError> {
        validate_fields(&self.name, &self.city, i64::from(self.strength))
    }

    /// Strength as a float, for the simulator's probability arithmetic.
    pub fn rating(&self) -> f64 {
        f64::from(self.strength)
    }
}

fn validate_fields(name: &str, city: &str, strength: i64) -> Result<(), LeagueError> {
    if name.trim().is_empty() {
        return Err(LeagueError::InvalidTeam {
            field: "name".into(),
            message: "must not be empty".into(),
        });
    }
    if city.trim().is_empty() {
        return Err(LeagueError::InvalidTeam {
            field: "city".into(),
            message: "must not be empty".into(),
        });
    }
    if !STRENGTH_RANGE.contains(&strength) {
        return Err(LeagueError::InvalidStrength { strength });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_team_accepts_range_bounds() {
        assert!(NewTeam::new("Arsenal", 1, "London").validate().is_ok());
        assert!(NewTeam::new("Arsenal", 100, "London").validate().is_ok());
    }

    #[test]
    fn new_team_rejects_out_of_range_strength() {
        assert_eq!(
            NewTeam::new("Arsenal", 0, "London").validate(),
            Err(LeagueError::InvalidStrength { strength: 0 })
        );
        assert_eq!(
            NewTeam::new("Arsenal", 101, "London").validate(),
            Err(LeagueError::InvalidStrength { strength: 101 })
        );
    }

    #[test]
    fn new_team_rejects_blank_name_and_city() {
        match NewTeam::new("  ", 50, "London").validate() {
            Err(LeagueError::InvalidTeam { field, .. }) => assert_eq!(field, "name"),
            other => panic!("expected InvalidTeam, got {other:?}"),
        }
        match NewTeam::new("Arsenal", 50, "").validate() {
            Err(LeagueError::InvalidTeam { field, .. }) => assert_eq!(field, "city"),
            other => panic!("expected InvalidTeam, got {other:?}"),
        }
    }

    #[test]
    fn into_team_trims_and_drops_blank_logo() {
        let team = NewTeam::new(" Chelsea ", 92, " London ")
            .with_logo("  ")
            .into_team(7)
            .unwrap();
        assert_eq!(team.id, 7);
        assert_eq!(team.name, "Chelsea");
        assert_eq!(team.city, "London");
        assert_eq!(team.strength, 92);
        assert!(team.logo.is_none());
    }
}
