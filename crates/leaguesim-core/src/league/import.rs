// Team roster import from CSV.
//
// Expected columns: name,strength,city,logo (logo may be empty or absent).
// Extra columns are ignored.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::team::NewTeam;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Deserialize)]
struct RawTeamRow {
    name: String,
    strength: i64,
    city: String,
    #[serde(default)]
    logo: Option<String>,
}

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<NewTeam>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeamRow>() {
        match result {
            Ok(raw) => {
                let team = NewTeam {
                    name: raw.name,
                    strength: raw.strength,
                    city: raw.city,
                    logo: raw.logo.filter(|l| !l.is_empty()),
                };
                if let Err(e) = team.validate() {
                    warn!("skipping team '{}': {}", team.name, e);
                    continue;
                }
                teams.push(team);
            }
            Err(e) => {
                warn!("skipping malformed team row: {}", e);
            }
        }
    }
    Ok(teams)
}

/// Load team definitions from a CSV file.
///
/// Rows that fail to parse or validate are skipped with a warning. A file
/// with no valid rows is an error.
pub fn load_teams_csv(path: &Path) -> Result<Vec<NewTeam>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let teams = load_teams_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if teams.is_empty() {
        return Err(ImportError::Validation(format!(
            "{} produced zero valid team rows",
            path.display()
        )));
    }
    Ok(teams)
}
