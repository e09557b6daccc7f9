// Simulation engine: schedule generation, match simulation, standings
// aggregation, and end-of-season projection.

pub mod prediction;
pub mod schedule;
pub mod simulator;
pub mod standings;
