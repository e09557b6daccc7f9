// Library root: re-exports all modules so the CLI and integration tests can
// reach the crate's public API.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod league;
pub mod season;
pub mod store;

pub use error::LeagueError;
pub use season::League;
pub use store::{LeagueStore, MatchFilter};
