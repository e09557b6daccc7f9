// League data model: teams, fixtures, standings rows, and roster import.

pub mod fixture;
pub mod import;
pub mod standing;
pub mod team;
