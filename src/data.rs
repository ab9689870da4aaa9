// Historical data schemas and the CSV ingestion boundary.
//
// Reads Statcast-style export CSVs: per-year pitch arsenal splits for
// batters (performance against each pitch type) and pitchers (performance
// with each pitch type, including usage), per-game batter logs, exit
// velocity summaries, and the active-player roster. All coercion happens
// here; the scoring code downstream only ever sees typed, finite values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Batting or throwing hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Right,
    Left,
    Switch,
}

impl Handedness {
    /// Parse a roster hand code. `B` (both) is accepted as switch.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "R" => Some(Handedness::Right),
            "L" => Some(Handedness::Left),
            "S" | "B" => Some(Handedness::Switch),
            _ => None,
        }
    }
}

/// One player-year-pitch row of observed performance.
///
/// The same shape covers both sides of a matchup: for a batter it is
/// performance *against* the pitch type, for a pitcher performance *with*
/// it (where `usage_pct` is meaningful). Rates `ba`/`slg`/`woba` and
/// `hard_hit_rate` are fractions; `whiff_pct` and `usage_pct` are
/// percentage points; `rv100` is run value per 100 pitches from the
/// batter's perspective. Immutable once ingested.
#[derive(Debug, Clone, Serialize)]
pub struct ArsenalRow {
    /// Canonical record key, "Last, First" form.
    pub name: String,
    pub team: String,
    pub year: u16,
    pub pitch_type: String,
    pub pitch_name: String,
    pub pitches: u32,
    pub usage_pct: f64,
    /// Average pitch velocity in mph; 0 when the export omits it.
    pub avg_velocity: f64,
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub hr: u32,
    pub so: u32,
    pub bb: u32,
    pub ba: f64,
    pub slg: f64,
    pub woba: f64,
    pub whiff_pct: f64,
    pub hard_hit_rate: f64,
    pub rv100: f64,
}

impl ArsenalRow {
    /// Isolated power for this split.
    pub fn iso(&self) -> f64 {
        self.slg - self.ba
    }

    /// Strikeout rate over PA for this split; 0 when no PA were recorded.
    pub fn k_rate(&self) -> f64 {
        if self.pa == 0 {
            0.0
        } else {
            self.so as f64 / self.pa as f64
        }
    }
}

/// One game line for a batter, feeding recent-form trends and the
/// due-for-HR context factors.
#[derive(Debug, Clone, Serialize)]
pub struct GameLog {
    pub name: String,
    pub team: String,
    pub date: NaiveDate,
    pub ab: u32,
    pub h: u32,
    pub hr: u32,
    pub bb: u32,
    pub so: u32,
    pub hbp: u32,
    pub sf: u32,
    pub sac: u32,
}

impl GameLog {
    /// Approximated plate appearances: AB + BB + HBP + SF + SAC.
    pub fn pa(&self) -> u32 {
        self.ab + self.bb + self.hbp + self.sf + self.sac
    }
}

/// Exit-velocity summary for a player-year.
#[derive(Debug, Clone, Serialize)]
pub struct ExitVeloRecord {
    pub name: String,
    pub team: String,
    pub year: u16,
    pub avg_exit_velo: f64,
    pub hard_hit_rate: f64,
    pub barrel_rate: f64,
}

/// One currently active player, used to restrict history to relevant
/// players and as the source of handedness for the platoon factor.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub team: String,
    pub bats: Handedness,
    pub throws: Handedness,
}

/// The immutable historical dataset the engine analyzes. Loaded once per
/// session; the engine never writes back to it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub batter_arsenal: Vec<ArsenalRow>,
    pub pitcher_arsenal: Vec<ArsenalRow>,
    pub game_logs: Vec<GameLog>,
    pub exit_velo: Vec<ExitVeloRecord>,
    pub roster: Vec<RosterEntry>,
}

/// File locations for a full dataset load.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub batter_arsenal: String,
    pub pitcher_arsenal: String,
    pub game_logs: String,
    pub exit_velo: String,
    pub roster: String,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Arsenal split CSV row. Counting stats are f64 because exports sometimes
/// carry fractional values. Extra columns are absorbed via `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawArsenalRow {
    name: String,
    #[serde(default)]
    team: String,
    year: u16,
    pitch_type: String,
    #[serde(default)]
    pitch_name: String,
    pitches: f64,
    #[serde(default, alias = "pitch_usage")]
    usage: f64,
    #[serde(default, alias = "avg_speed")]
    avg_velocity: f64,
    #[serde(default)]
    pa: f64,
    ab: f64,
    #[serde(alias = "hits")]
    h: f64,
    hr: f64,
    #[serde(alias = "k")]
    so: f64,
    #[serde(default)]
    bb: f64,
    ba: f64,
    slg: f64,
    woba: f64,
    #[serde(alias = "whiff_pct")]
    whiff_percent: f64,
    #[serde(alias = "hard_hit_pct")]
    hard_hit_percent: f64,
    #[serde(default, alias = "rv100")]
    run_value_per_100: f64,
    /// Absorb any extra export columns.
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawGameLog {
    name: String,
    #[serde(default)]
    team: String,
    date: NaiveDate,
    ab: f64,
    h: f64,
    hr: f64,
    #[serde(default)]
    bb: f64,
    #[serde(default, alias = "k")]
    so: f64,
    #[serde(default)]
    hbp: f64,
    #[serde(default)]
    sf: f64,
    #[serde(default)]
    sac: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawExitVelo {
    name: String,
    #[serde(default)]
    team: String,
    year: u16,
    #[serde(alias = "avg_ev")]
    avg_exit_velo: f64,
    #[serde(alias = "hard_hit_pct")]
    hard_hit_percent: f64,
    #[serde(default, alias = "barrel_pct")]
    barrel_percent: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawRosterEntry {
    name: String,
    #[serde(default)]
    team: String,
    bats: String,
    throws: String,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns true if all given f64 values are finite (not NaN or Infinity).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_arsenal_from_reader<R: Read>(rdr: R) -> Result<Vec<ArsenalRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawArsenalRow>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[
                    raw.ba,
                    raw.slg,
                    raw.woba,
                    raw.whiff_percent,
                    raw.hard_hit_percent,
                    raw.run_value_per_100,
                ]) {
                    warn!(
                        "skipping arsenal row '{}' {} {}: non-finite rate value",
                        raw.name.trim(),
                        raw.year,
                        raw.pitch_type.trim()
                    );
                    continue;
                }
                if raw.pitch_type.trim().is_empty() {
                    warn!("skipping arsenal row '{}': empty pitch type", raw.name.trim());
                    continue;
                }
                rows.push(ArsenalRow {
                    name: raw.name.trim().to_string(),
                    team: raw.team.trim().to_string(),
                    year: raw.year,
                    pitch_type: raw.pitch_type.trim().to_uppercase(),
                    pitch_name: raw.pitch_name.trim().to_string(),
                    pitches: raw.pitches.round().max(0.0) as u32,
                    usage_pct: raw.usage,
                    avg_velocity: if raw.avg_velocity.is_finite() {
                        raw.avg_velocity
                    } else {
                        0.0
                    },
                    pa: raw.pa.round().max(0.0) as u32,
                    ab: raw.ab.round().max(0.0) as u32,
                    h: raw.h.round().max(0.0) as u32,
                    hr: raw.hr.round().max(0.0) as u32,
                    so: raw.so.round().max(0.0) as u32,
                    bb: raw.bb.round().max(0.0) as u32,
                    ba: raw.ba,
                    slg: raw.slg,
                    woba: raw.woba,
                    whiff_pct: raw.whiff_percent,
                    // Exports report hard-hit in percentage points; the
                    // scoring code works in fractions.
                    hard_hit_rate: raw.hard_hit_percent / 100.0,
                    rv100: raw.run_value_per_100,
                });
            }
            Err(e) => {
                warn!("skipping malformed arsenal row: {}", e);
            }
        }
    }
    Ok(rows)
}

fn load_game_logs_from_reader<R: Read>(rdr: R) -> Result<Vec<GameLog>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut logs = Vec::new();
    for result in reader.deserialize::<RawGameLog>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[raw.ab, raw.h, raw.hr]) {
                    warn!(
                        "skipping game log '{}' {}: non-finite counting stat",
                        raw.name.trim(),
                        raw.date
                    );
                    continue;
                }
                logs.push(GameLog {
                    name: raw.name.trim().to_string(),
                    team: raw.team.trim().to_string(),
                    date: raw.date,
                    ab: raw.ab.round().max(0.0) as u32,
                    h: raw.h.round().max(0.0) as u32,
                    hr: raw.hr.round().max(0.0) as u32,
                    bb: raw.bb.round().max(0.0) as u32,
                    so: raw.so.round().max(0.0) as u32,
                    hbp: raw.hbp.round().max(0.0) as u32,
                    sf: raw.sf.round().max(0.0) as u32,
                    sac: raw.sac.round().max(0.0) as u32,
                });
            }
            Err(e) => {
                warn!("skipping malformed game log row: {}", e);
            }
        }
    }
    Ok(logs)
}

fn load_exit_velo_from_reader<R: Read>(rdr: R) -> Result<Vec<ExitVeloRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawExitVelo>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[raw.avg_exit_velo, raw.hard_hit_percent, raw.barrel_percent]) {
                    warn!(
                        "skipping exit velo row '{}': non-finite value",
                        raw.name.trim()
                    );
                    continue;
                }
                records.push(ExitVeloRecord {
                    name: raw.name.trim().to_string(),
                    team: raw.team.trim().to_string(),
                    year: raw.year,
                    avg_exit_velo: raw.avg_exit_velo,
                    hard_hit_rate: raw.hard_hit_percent / 100.0,
                    barrel_rate: raw.barrel_percent / 100.0,
                });
            }
            Err(e) => {
                warn!("skipping malformed exit velo row: {}", e);
            }
        }
    }
    Ok(records)
}

fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut roster = Vec::new();
    for result in reader.deserialize::<RawRosterEntry>() {
        match result {
            Ok(raw) => {
                let bats = match Handedness::from_code(&raw.bats) {
                    Some(h) => h,
                    None => {
                        warn!(
                            "skipping roster entry '{}': unknown bats code '{}'",
                            raw.name.trim(),
                            raw.bats
                        );
                        continue;
                    }
                };
                let throws = match Handedness::from_code(&raw.throws) {
                    Some(h) => h,
                    None => {
                        warn!(
                            "skipping roster entry '{}': unknown throws code '{}'",
                            raw.name.trim(),
                            raw.throws
                        );
                        continue;
                    }
                };
                roster.push(RosterEntry {
                    name: raw.name.trim().to_string(),
                    team: raw.team.trim().to_string(),
                    bats,
                    throws,
                });
            }
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
            }
        }
    }
    Ok(roster)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> DataError + '_ {
    move |e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load arsenal split rows (batter-vs-pitch or pitcher-with-pitch) from a CSV file.
pub fn load_arsenal(path: &Path) -> Result<Vec<ArsenalRow>, DataError> {
    load_arsenal_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load per-game batter logs from a CSV file.
pub fn load_game_logs(path: &Path) -> Result<Vec<GameLog>, DataError> {
    load_game_logs_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load exit-velocity summaries from a CSV file.
pub fn load_exit_velo(path: &Path) -> Result<Vec<ExitVeloRecord>, DataError> {
    load_exit_velo_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load the active-player roster from a CSV file.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, DataError> {
    load_roster_from_reader(open(path)?).map_err(csv_err(path))
}

impl Dataset {
    /// Load a complete dataset from explicit paths. The arsenal files must
    /// produce at least one valid row each; the supporting files may be
    /// empty (their consumers degrade to neutral defaults).
    pub fn load(paths: &DataPaths) -> Result<Dataset, DataError> {
        let batter_arsenal = load_arsenal(Path::new(&paths.batter_arsenal))?;
        let pitcher_arsenal = load_arsenal(Path::new(&paths.pitcher_arsenal))?;
        let game_logs = load_game_logs(Path::new(&paths.game_logs))?;
        let exit_velo = load_exit_velo(Path::new(&paths.exit_velo))?;
        let roster = load_roster(Path::new(&paths.roster))?;

        if batter_arsenal.is_empty() {
            return Err(DataError::Validation(
                "batter arsenal CSV produced zero valid rows".into(),
            ));
        }
        if pitcher_arsenal.is_empty() {
            return Err(DataError::Validation(
                "pitcher arsenal CSV produced zero valid rows".into(),
            ));
        }

        Ok(Dataset {
            batter_arsenal,
            pitcher_arsenal,
            game_logs,
            exit_velo,
            roster,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
