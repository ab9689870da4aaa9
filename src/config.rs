// Scoring configuration: component weights, shrinkage and usage thresholds,
// platoon factors, league-average baselines, recency weights, and the static
// normalization fallbacks. Every hand-tuned constant in the scoring math
// lives here as a named, overridable value (scoring.toml).

use crate::analysis::ranges::{builtin_default_ranges, MetricRange};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Scoring config sections
// ---------------------------------------------------------------------------

/// Weights for the six composite components. They must sum to 1.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub arsenal: f64,
    pub batter_overall: f64,
    pub pitcher_overall: f64,
    pub historical: f64,
    pub recent_form: f64,
    pub contextual: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        ComponentWeights {
            arsenal: 0.40,
            batter_overall: 0.15,
            pitcher_overall: 0.10,
            historical: 0.05,
            recent_form: 0.10,
            contextual: 0.20,
        }
    }
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.arsenal
            + self.batter_overall
            + self.pitcher_overall
            + self.historical
            + self.recent_form
            + self.contextual
    }
}

/// Handedness multipliers applied to the weighted composite. Switch hitters
/// always take the favorable factor regardless of the pitcher's hand.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatoonFactors {
    pub righty_vs_righty: f64,
    pub lefty_vs_lefty: f64,
    pub righty_vs_lefty: f64,
    pub lefty_vs_righty: f64,
    pub switch_hitter: f64,
}

impl Default for PlatoonFactors {
    fn default() -> Self {
        PlatoonFactors {
            righty_vs_righty: 0.95,
            lefty_vs_lefty: 0.90,
            righty_vs_lefty: 1.05,
            lefty_vs_righty: 1.10,
            switch_hitter: 1.10,
        }
    }
}

/// League-average baselines used for shrinkage targets and missing-data
/// fallbacks. Rates are fractions; whiff is in percentage points and exit
/// velocity in mph, matching how the source data reports them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeagueAverages {
    pub avg: f64,
    pub slg: f64,
    pub iso: f64,
    pub woba: f64,
    pub k_rate: f64,
    pub bb_rate: f64,
    pub hr_per_pa: f64,
    pub hard_hit: f64,
    pub barrel: f64,
    pub whiff_pct: f64,
    pub exit_velo: f64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        LeagueAverages {
            avg: 0.245,
            slg: 0.400,
            iso: 0.155,
            woba: 0.320,
            k_rate: 0.22,
            bb_rate: 0.08,
            hr_per_pa: 0.031,
            hard_hit: 0.35,
            barrel: 0.06,
            whiff_pct: 24.0,
            exit_velo: 88.5,
        }
    }
}

/// Fixed recency weights for multi-year pooling: the entry at index 0 applies
/// to the most recent year, index 1 to the year before, and so on; years
/// beyond the table take `older`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecencyWeights {
    pub by_year: Vec<f64>,
    pub older: f64,
}

impl Default for RecencyWeights {
    fn default() -> Self {
        RecencyWeights {
            by_year: vec![4.0, 2.0, 1.0, 0.5],
            older: 0.25,
        }
    }
}

impl RecencyWeights {
    /// Weight for a year `years_back` behind the most recent observed year.
    pub fn weight(&self, years_back: usize) -> f64 {
        self.by_year.get(years_back).copied().unwrap_or(self.older)
    }
}

// ---------------------------------------------------------------------------
// Top-level scoring config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Shrinkage constant K in `confidence = PA / (PA + K)`.
    pub shrinkage_pa: f64,
    /// Analyses built on fewer PA than this carry a low-sample warning.
    pub low_sample_pa: f64,
    /// Pitches below this usage share (percent) are excluded from weighting.
    pub min_usage_pct: f64,
    /// Populations smaller than this fall back to the static range table.
    pub min_range_observations: usize,
    /// Number of most-recent games considered for recent-form trends.
    pub recent_game_window: usize,
    /// Expected hits between home runs, for the due-by-hits context factor.
    pub expected_hits_per_hr: f64,
    /// Minimum recent PA before hot/cold contact flags are applied.
    pub min_recent_pa_for_contact: u32,
    pub weights: ComponentWeights,
    pub platoon: PlatoonFactors,
    pub league: LeagueAverages,
    pub recency: RecencyWeights,
    pub default_ranges: HashMap<String, MetricRange>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            shrinkage_pa: 100.0,
            low_sample_pa: 50.0,
            min_usage_pct: 5.0,
            min_range_observations: 10,
            recent_game_window: 15,
            expected_hits_per_hr: 10.0,
            min_recent_pa_for_contact: 20,
            weights: ComponentWeights::default(),
            platoon: PlatoonFactors::default(),
            league: LeagueAverages::default(),
            recency: RecencyWeights::default(),
            default_ranges: builtin_default_ranges(),
        }
    }
}

impl ScoringConfig {
    /// Check internal consistency of the configured constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (self.weights.sum() - 1.0).abs() > 1e-6 {
            return Err(ConfigError::ValidationError {
                field: "weights".to_string(),
                message: format!(
                    "component weights must sum to 1.0, got {}",
                    self.weights.sum()
                ),
            });
        }
        if self.shrinkage_pa <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: "shrinkage_pa".to_string(),
                message: "shrinkage constant must be positive".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.min_usage_pct) {
            return Err(ConfigError::ValidationError {
                field: "min_usage_pct".to_string(),
                message: "usage threshold must be within 0..=100 percent".to_string(),
            });
        }
        if self.recent_game_window < 2 {
            return Err(ConfigError::ValidationError {
                field: "recent_game_window".to_string(),
                message: "recent window needs at least 2 games".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[scoring]` table in scoring.toml.
#[derive(Debug, Deserialize)]
struct ScoringFile {
    #[serde(default)]
    scoring: ScoringConfig,
}

/// Load the scoring config from a TOML file. Fields absent from the file
/// keep their built-in defaults, so a partial override is valid.
pub fn load_scoring_config(path: &Path) -> Result<ScoringConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let file: ScoringFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.scoring.validate()?;
    Ok(file.scoring)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
