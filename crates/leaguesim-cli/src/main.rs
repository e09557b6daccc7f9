// League simulator entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, stdout is for output)
// 3. Load config, copying defaults on first run
// 4. Open database
// 5. Seed teams if the database is empty, generate the schedule if no
//    matches exist
// 6. Run the requested command

mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use leaguesim_core::config;
use leaguesim_core::db::Database;
use leaguesim_core::engine::simulator::MatchSimulator;
use leaguesim_core::league::fixture::Match;
use leaguesim_core::league::import::load_teams_csv;
use leaguesim_core::league::standing::StandingEntry;
use leaguesim_core::league::team::NewTeam;
use leaguesim_core::{League, MatchFilter};

use render::Names;

#[derive(Parser, Debug)]
#[command(name = "leaguesim")]
#[command(about = "Simulate a double round-robin league", long_about = None)]
struct Args {
    /// Seed for reproducible simulations (random when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print JSON instead of text tables
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding config/, defaults/ and logs/ (defaults to the cwd)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List teams
    Teams,
    /// List fixtures, grouped by week
    Fixtures {
        /// Only this week
        #[arg(long)]
        week: Option<u32>,
        /// Only played matches
        #[arg(long, conflicts_with = "unplayed")]
        played: bool,
        /// Only unplayed matches
        #[arg(long)]
        unplayed: bool,
    },
    /// Show the league table
    Table,
    /// Simulate every unplayed match of a week
    PlayWeek { week: u32 },
    /// Simulate every remaining match of the season
    PlayAll,
    /// Clear all results
    Reset,
    /// Discard all matches and build a new schedule
    Regenerate,
    /// Project the final table from results through a week
    Predict {
        #[arg(long)]
        after_week: u32,
    },
    /// Show the champion once the season is complete
    Champion,
    /// Add a team
    AddTeam {
        name: String,
        #[arg(long)]
        strength: i64,
        #[arg(long)]
        city: String,
        #[arg(long)]
        logo: Option<String>,
    },
    /// Edit a team's details
    EditTeam {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        strength: Option<u32>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        logo: Option<String>,
    },
    /// Delete a team and its matches
    RemoveTeam { id: i64 },
    /// Schedule an extra match
    AddMatch {
        home: i64,
        away: i64,
        #[arg(long, allow_negative_numbers = true)]
        week: i64,
    },
    /// Enter a result by hand
    Result {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        home: i64,
        #[arg(allow_negative_numbers = true)]
        away: i64,
    },
    /// Delete a match
    RemoveMatch { id: i64 },
    /// Add teams from a CSV file (name,strength,city,logo)
    ImportTeams {
        path: PathBuf,
        /// Rebuild the schedule afterwards
        #[arg(long)]
        regenerate: bool,
    },
}

fn main() -> Result<()> {
    // 1. Parse arguments
    let args = Args::parse();
    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };

    // 2. Initialize tracing
    init_tracing(&base_dir)?;
    info!("leaguesim starting: {:?}", args.command);

    // 3. Load config
    let config = config::load_config_in(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} seed teams",
        config.league.name,
        config.league.teams.len()
    );

    // 4. Open database
    let db_path = resolve(&base_dir, &config.db_path);
    let db_path_str = db_path
        .to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", db_path.display()))?;
    let db = Database::open(db_path_str).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    // 5. Bootstrap
    let league = League::new(db, MatchSimulator::new(config.simulation));
    let seeded = league.seed_teams(&config.league.teams)?;
    if !seeded.is_empty() {
        info!("Inserted {} seed teams", seeded.len());
    }
    if league.ensure_schedule()? {
        info!("Generated initial schedule");
    }

    // 6. Run the command
    let mut rng = make_rng(args.seed);
    run(&league, args.command, args.json, rng.as_mut())
}

fn run(league: &League<Database>, command: Command, json: bool, rng: &mut dyn RngCore) -> Result<()> {
    match command {
        Command::Teams => {
            let teams = league.teams()?;
            emit(json, &teams, || render::teams_text(&teams))
        }
        Command::Fixtures {
            week,
            played,
            unplayed,
        } => {
            let filter = MatchFilter {
                week,
                played: match (played, unplayed) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            fixture_view(league, &league.fixtures(filter)?)
                .and_then(|(rows_json, text)| output(json, rows_json, text))
        }
        Command::Table => print_table(league, &league.standings()?, json),
        Command::PlayWeek { week } => {
            let played = league.play_week(week, rng)?;
            if played.is_empty() && !json {
                println!("Week {week}: nothing to play");
            } else {
                fixture_view(league, &played)
                    .and_then(|(rows_json, text)| output(json, rows_json, text))?;
            }
            if !json {
                print_table(league, &league.standings()?, false)?;
            }
            Ok(())
        }
        Command::PlayAll => {
            let played = league.play_all(rng)?;
            if !json {
                println!("Played {} matches", played.len());
            }
            print_table(league, &league.standings()?, json)
        }
        Command::Reset => {
            league.reset()?;
            if !json {
                println!("All results cleared");
            }
            print_table(league, &league.standings()?, json)
        }
        Command::Regenerate => {
            let created = league.regenerate_schedule()?;
            fixture_view(league, &created)
                .and_then(|(rows_json, text)| output(json, rows_json, text))
        }
        Command::Predict { after_week } => {
            let predicted = league.predict_standings(after_week, rng)?;
            print_table(league, &predicted, json)
        }
        Command::Champion => {
            let teams = league.teams()?;
            let names = Names::new(&teams);
            match league.champion()? {
                Some(entry) => {
                    let rows = render::table_rows(std::slice::from_ref(&entry), &names);
                    emit(json, &rows[0], || format!("Champion: {}\n", rows[0].team))
                }
                None => emit(json, &serde_json::Value::Null, || {
                    "Season not finished yet\n".to_string()
                }),
            }
        }
        Command::AddTeam {
            name,
            strength,
            city,
            logo,
        } => {
            let mut team = NewTeam::new(name, strength, city);
            team.logo = logo;
            let stored = league.add_team(&team)?;
            emit(json, &stored, || format!("Added team {} ({})\n", stored.name, stored.id))
        }
        Command::EditTeam {
            id,
            name,
            strength,
            city,
            logo,
        } => {
            let mut team = league
                .team(id)?
                .with_context(|| format!("team {id} not found"))?;
            if let Some(name) = name {
                team.name = name;
            }
            if let Some(strength) = strength {
                team.strength = strength;
            }
            if let Some(city) = city {
                team.city = city;
            }
            if logo.is_some() {
                team.logo = logo;
            }
            let stored = league.edit_team(&team)?;
            emit(json, &stored, || format!("Updated team {} ({})\n", stored.name, stored.id))
        }
        Command::RemoveTeam { id } => {
            league.remove_team(id)?;
            emit(json, &id, || format!("Removed team {id}\n"))
        }
        Command::AddMatch { home, away, week } => {
            let m = league.add_match(home, away, week)?;
            fixture_view(league, std::slice::from_ref(&m))
                .and_then(|(rows_json, text)| output(json, rows_json, text))
        }
        Command::Result { id, home, away } => {
            let m = league.record_result(id, home, away)?;
            fixture_view(league, std::slice::from_ref(&m))
                .and_then(|(rows_json, text)| output(json, rows_json, text))?;
            if !json {
                print_table(league, &league.standings()?, false)?;
            }
            Ok(())
        }
        Command::RemoveMatch { id } => {
            let m = league.remove_match(id)?;
            emit(json, &m, || format!("Removed match {}\n", m.id))
        }
        Command::ImportTeams { path, regenerate } => {
            let imported = load_teams_csv(&path)?;
            let mut added = Vec::with_capacity(imported.len());
            for team in &imported {
                added.push(league.add_team(team)?);
            }
            info!("Imported {} teams from {}", added.len(), path.display());
            if regenerate {
                league.regenerate_schedule()?;
            }
            emit(json, &added, || render::teams_text(&added))
        }
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

/// Print `value` as pretty JSON, or the lazily built text.
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("failed to serialize output")?
        );
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn output(json: bool, value: serde_json::Value, text: String) -> Result<()> {
    emit(json, &value, || text)
}

fn fixture_view(
    league: &League<Database>,
    matches: &[Match],
) -> Result<(serde_json::Value, String)> {
    let teams = league.teams()?;
    let names = Names::new(&teams);
    let rows = render::fixture_rows(matches, &names);
    let value = serde_json::to_value(&rows).context("failed to serialize fixtures")?;
    Ok((value, render::fixtures_text(&rows)))
}

fn print_table(
    league: &League<Database>,
    entries: &[StandingEntry],
    json: bool,
) -> Result<()> {
    let teams = league.teams()?;
    let names = Names::new(&teams);
    let rows = render::table_rows(entries, &names);
    emit(json, &rows, || render::table_text(&rows))
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Seeded generator when `--seed` is given, the thread-local one otherwise.
fn make_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Box::new(ChaCha8Rng::seed_from_u64(seed))
        }
        None => Box::new(rand::thread_rng()),
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Initialize tracing to log to a file (stdout carries tables and JSON).
fn init_tracing(base_dir: &Path) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("leaguesim.log"))
        .context("failed to open log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leaguesim=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
