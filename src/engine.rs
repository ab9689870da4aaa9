// The engine facade: owns the immutable dataset and scoring config, caches
// the deterministic per-population computations (metric ranges, league
// pitch baselines, pitcher arsenals) keyed by the active-years selection,
// and exposes the public analysis entry points plus a bounded-concurrency
// batch runner for slates.

use crate::analysis::aggregate::{aggregate_games, pooled_profile, yearly_series, SeasonAggregate};
use crate::analysis::arsenal::{
    analyze_arsenal, batter_vs_pitch, build_arsenal, league_pitch_baselines,
    ArsenalMatchupResult, PitchBaseline, PitchProfile,
};
use crate::analysis::composite::{
    score_hr_potential, score_matchup, DueContext, HrContext, HrPotential, MatchupContext,
    MatchupScore,
};
use crate::analysis::ranges::{compute_range, MetricRange};
use crate::analysis::trends::{recent_form, series_trend, TrendResult};
use crate::config::ScoringConfig;
use crate::data::{ArsenalRow, Dataset, ExitVeloRecord, GameLog, Handedness};
use crate::identity::{resolve, PlayerRef};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tracing::debug;

/// Matchups at least this favorable count toward a team's favorable side.
const FAVORABLE_ADVANTAGE: f64 = 0.3;
/// Matchups at least this unfavorable count as difficult.
const DIFFICULT_ADVANTAGE: f64 = -0.3;
/// Team summaries list at most this many targets/toughest matchups.
const SUMMARY_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid identity: {field} must not be empty")]
    InvalidIdentity { field: &'static str },

    #[error("batch task failed: {0}")]
    TaskFailed(String),
}

// ---------------------------------------------------------------------------
// Per-population derived context (cached)
// ---------------------------------------------------------------------------

/// Deterministic functions of (dataset, active years): normalization ranges
/// and league-average performance per pitch type.
#[derive(Debug)]
struct PopulationContext {
    ranges: HashMap<String, MetricRange>,
    baselines: HashMap<String, PitchBaseline>,
}

// ---------------------------------------------------------------------------
// Team report types
// ---------------------------------------------------------------------------

/// One opposing batter's arsenal verdict within a team report.
#[derive(Debug, Clone, Serialize)]
pub struct BatterArsenalReport {
    pub batter: String,
    pub result: ArsenalMatchupResult,
}

/// Aggregate view of how a lineup matches up against one pitcher.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub favorable_count: usize,
    pub difficult_count: usize,
    pub average_advantage: f64,
    pub top_targets: Vec<String>,
    pub toughest_matchups: Vec<String>,
}

/// Output of `analyze_arsenal_matchup`: per-batter results plus the
/// lineup-level summary.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMatchupReport {
    pub pitcher: String,
    pub batters: Vec<BatterArsenalReport>,
    pub summary: TeamSummary,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct MatchupEngine {
    dataset: Dataset,
    config: ScoringConfig,
    population_cache: Mutex<HashMap<Vec<u16>, Arc<PopulationContext>>>,
    arsenal_cache: Mutex<HashMap<(String, Vec<u16>), Arc<Vec<PitchProfile>>>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn year_selected(active_years: &[u16], year: u16) -> bool {
    active_years.is_empty() || active_years.contains(&year)
}

fn validate_ref(player: &PlayerRef, field: &'static str) -> Result<(), EngineError> {
    if player.name.trim().is_empty() {
        return Err(EngineError::InvalidIdentity { field });
    }
    Ok(())
}

impl MatchupEngine {
    pub fn new(dataset: Dataset, config: ScoringConfig) -> Self {
        MatchupEngine {
            dataset,
            config,
            population_cache: Mutex::new(HashMap::new()),
            arsenal_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    // -- cached population context --

    fn years_key(active_years: &[u16]) -> Vec<u16> {
        let mut key = active_years.to_vec();
        key.sort_unstable();
        key.dedup();
        key
    }

    fn population_for(&self, active_years: &[u16]) -> Arc<PopulationContext> {
        let key = Self::years_key(active_years);
        if let Some(ctx) = lock(&self.population_cache).get(&key) {
            return Arc::clone(ctx);
        }
        debug!("computing population context for years {:?}", key);
        let ctx = Arc::new(self.compute_population(&key));
        lock(&self.population_cache)
            .entry(key)
            .or_insert(ctx)
            .clone()
    }

    fn compute_population(&self, active_years: &[u16]) -> PopulationContext {
        let mut slg = Vec::new();
        let mut iso = Vec::new();
        let mut woba = Vec::new();
        let mut hard_hit = Vec::new();
        let mut whiff = Vec::new();
        let mut rv100 = Vec::new();
        let mut k_rate = Vec::new();
        let mut usage = Vec::new();

        let rows = self
            .dataset
            .batter_arsenal
            .iter()
            .chain(self.dataset.pitcher_arsenal.iter())
            .filter(|r| year_selected(active_years, r.year));
        for row in rows {
            slg.push(row.slg);
            iso.push(row.iso());
            woba.push(row.woba);
            hard_hit.push(row.hard_hit_rate);
            whiff.push(row.whiff_pct);
            rv100.push(row.rv100);
            if row.pa > 0 {
                k_rate.push(row.k_rate());
            }
            if row.usage_pct > 0.0 {
                usage.push(row.usage_pct);
            }
        }

        let defaults = &self.config.default_ranges;
        let min_obs = self.config.min_range_observations;
        let mut ranges = HashMap::new();
        for (metric, values) in [
            ("slg", &slg),
            ("iso", &iso),
            ("woba", &woba),
            ("hard_hit", &hard_hit),
            ("whiff", &whiff),
            ("rv100", &rv100),
            ("k_rate", &k_rate),
            ("usage", &usage),
        ] {
            if let Some(range) = compute_range(values, metric, defaults, min_obs) {
                ranges.insert(metric.to_string(), range);
            }
        }
        // Metrics never observed at the pitch level keep their static
        // defaults so normalization stays well-defined.
        for (metric, range) in defaults {
            ranges.entry(metric.clone()).or_insert(*range);
        }

        let baselines = league_pitch_baselines(
            &self.dataset.batter_arsenal,
            active_years,
        );

        PopulationContext { ranges, baselines }
    }

    // -- cached pitcher arsenals --

    fn arsenal_for(
        &self,
        pitcher_key: &str,
        rows: &[&ArsenalRow],
        active_years: &[u16],
    ) -> Arc<Vec<PitchProfile>> {
        let key = (pitcher_key.to_string(), Self::years_key(active_years));
        if let Some(arsenal) = lock(&self.arsenal_cache).get(&key) {
            return Arc::clone(arsenal);
        }
        debug!("building arsenal for {pitcher_key}");
        let arsenal = Arc::new(build_arsenal(
            rows,
            &self.config.recency,
            self.config.min_usage_pct,
        ));
        lock(&self.arsenal_cache)
            .entry(key)
            .or_insert(arsenal)
            .clone()
    }

    // -- resolution helpers --

    fn batter_rows(&self, batter: &PlayerRef, active_years: &[u16]) -> Vec<&ArsenalRow> {
        resolve(batter, &self.dataset.batter_arsenal)
            .into_iter()
            .filter(|r| year_selected(active_years, r.year))
            .collect()
    }

    fn pitcher_rows(&self, pitcher: &PlayerRef, active_years: &[u16]) -> Vec<&ArsenalRow> {
        resolve(pitcher, &self.dataset.pitcher_arsenal)
            .into_iter()
            .filter(|r| year_selected(active_years, r.year))
            .collect()
    }

    /// Most recent game logs for a batter, newest first, bounded by the
    /// configured window.
    fn recent_games(&self, batter: &PlayerRef) -> Vec<GameLog> {
        let mut games: Vec<GameLog> = resolve(batter, &self.dataset.game_logs)
            .into_iter()
            .cloned()
            .collect();
        games.sort_by(|a, b| b.date.cmp(&a.date));
        games.truncate(self.config.recent_game_window);
        games
    }

    fn exit_velo_for(&self, batter: &PlayerRef) -> Option<&ExitVeloRecord> {
        resolve(batter, &self.dataset.exit_velo)
            .into_iter()
            .max_by_key(|r| r.year)
    }

    fn hands_for(&self, player: &PlayerRef) -> (Option<Handedness>, Option<Handedness>) {
        let entries = resolve(player, &self.dataset.roster);
        match entries.first() {
            Some(e) => (Some(e.bats), Some(e.throws)),
            None => (None, None),
        }
    }

    /// Scan the full game history newest-first and count AB and hits since
    /// the last homer. Expected AB/HR comes from the pooled profile.
    fn due_context(&self, batter: &PlayerRef, profile_ab: u32, profile_hr: u32) -> DueContext {
        let mut games: Vec<&GameLog> = resolve(batter, &self.dataset.game_logs);
        if games.is_empty() {
            return DueContext::default();
        }
        games.sort_by(|a, b| b.date.cmp(&a.date));

        let mut ab_since = 0u32;
        let mut hits_since = 0u32;
        let mut saw_hr = false;
        for game in &games {
            if game.hr > 0 {
                saw_hr = true;
                break;
            }
            ab_since += game.ab;
            hits_since += game.h;
        }
        if !saw_hr {
            // Never homered in the log: "since last HR" is undefined.
            return DueContext::default();
        }

        let expected_ab_per_hr = if profile_hr > 0 {
            Some(profile_ab as f64 / profile_hr as f64)
        } else {
            None
        };
        DueContext {
            ab_since_last_hr: Some(ab_since),
            hits_since_last_hr: Some(hits_since),
            expected_ab_per_hr,
        }
    }

    // -- public API --

    /// Full composite analysis of one batter-pitcher pair. Total for any
    /// pair with non-empty names; unknown players degrade to a neutral,
    /// low-confidence result.
    pub fn analyze_matchup(
        &self,
        batter: &PlayerRef,
        pitcher: &PlayerRef,
        active_years: &[u16],
    ) -> Result<MatchupScore, EngineError> {
        validate_ref(batter, "batter name")?;
        validate_ref(pitcher, "pitcher name")?;

        let population = self.population_for(active_years);

        let batter_rows = self.batter_rows(batter, active_years);
        let pitcher_rows = self.pitcher_rows(pitcher, active_years);
        let batter_profile = pooled_profile(&batter_rows, &self.config.recency);
        let pitcher_profile = pooled_profile(&pitcher_rows, &self.config.recency);

        let pitcher_key = pitcher_rows
            .first()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| pitcher.name.clone());
        let arsenal = self.arsenal_for(&pitcher_key, &pitcher_rows, active_years);
        let by_pitch = batter_vs_pitch(&batter_rows, &self.config.recency);
        let arsenal_result = analyze_arsenal(
            &arsenal,
            &by_pitch,
            &population.baselines,
            &self.config.league,
        );

        let iso_series = yearly_series(&batter_rows, |r| r.iso());
        let slg_series = yearly_series(&batter_rows, |r| r.slg);
        let woba_series = yearly_series(&batter_rows, |r| r.woba);
        let iso_trend = series_trend(&iso_series);
        let historical: Vec<TrendResult> = [
            iso_trend,
            series_trend(&slg_series),
            series_trend(&woba_series),
        ]
        .into_iter()
        .flatten()
        .collect();

        let games = self.recent_games(batter);
        let recent = recent_form(&games);
        let season: Option<SeasonAggregate> = if games.is_empty() {
            None
        } else {
            Some(aggregate_games(&games))
        };

        let (batter_bats, _) = self.hands_for(batter);
        let (_, pitcher_throws) = self.hands_for(pitcher);
        let due = self.due_context(batter, batter_profile.ab, batter_profile.hr);
        let batter_ev = self.exit_velo_for(batter);

        let ctx = MatchupContext {
            batter_name: &batter.name,
            pitcher_name: &pitcher.name,
            batter: &batter_profile,
            pitcher: &pitcher_profile,
            arsenal: &arsenal_result,
            historical: &historical,
            iso_trend: iso_trend.as_ref(),
            recent: recent.as_ref(),
            season: season.as_ref(),
            batter_hand: batter_bats,
            pitcher_hand: pitcher_throws,
            batter_exit_velo: batter_ev,
            due,
            ranges: &population.ranges,
        };
        Ok(score_matchup(&ctx, &self.config))
    }

    /// Arsenal-level analysis of one pitcher against a lineup, with a team
    /// summary of favorable and difficult matchups.
    pub fn analyze_arsenal_matchup(
        &self,
        pitcher: &PlayerRef,
        batters: &[PlayerRef],
        active_years: &[u16],
    ) -> Result<TeamMatchupReport, EngineError> {
        validate_ref(pitcher, "pitcher name")?;
        for batter in batters {
            validate_ref(batter, "batter name")?;
        }

        let population = self.population_for(active_years);
        let pitcher_rows = self.pitcher_rows(pitcher, active_years);
        let pitcher_key = pitcher_rows
            .first()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| pitcher.name.clone());
        let arsenal = self.arsenal_for(&pitcher_key, &pitcher_rows, active_years);

        let mut reports = Vec::with_capacity(batters.len());
        for batter in batters {
            let batter_rows = self.batter_rows(batter, active_years);
            let by_pitch = batter_vs_pitch(&batter_rows, &self.config.recency);
            let result = analyze_arsenal(
                &arsenal,
                &by_pitch,
                &population.baselines,
                &self.config.league,
            );
            reports.push(BatterArsenalReport {
                batter: batter.name.clone(),
                result,
            });
        }

        let summary = summarize_team(&reports);
        Ok(TeamMatchupReport {
            pitcher: pitcher.name.clone(),
            batters: reports,
            summary,
        })
    }

    /// HR-specific analysis with warnings, insights, and recommendations.
    pub fn analyze_hr_potential(
        &self,
        batter: &PlayerRef,
        pitcher: &PlayerRef,
        active_years: &[u16],
    ) -> Result<HrPotential, EngineError> {
        validate_ref(batter, "batter name")?;
        validate_ref(pitcher, "pitcher name")?;

        let batter_rows = self.batter_rows(batter, active_years);
        let pitcher_rows = self.pitcher_rows(pitcher, active_years);
        let batter_profile = pooled_profile(&batter_rows, &self.config.recency);

        let pitcher_key = pitcher_rows
            .first()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| pitcher.name.clone());
        let arsenal = self.arsenal_for(&pitcher_key, &pitcher_rows, active_years);
        let by_pitch = batter_vs_pitch(&batter_rows, &self.config.recency);

        let iso_series = yearly_series(&batter_rows, |r| r.iso());
        let iso_trend = series_trend(&iso_series);
        let due = self.due_context(batter, batter_profile.ab, batter_profile.hr);

        let ctx = HrContext {
            batter_name: &batter.name,
            pitcher_name: &pitcher.name,
            batter: &batter_profile,
            arsenal: &arsenal,
            batter_by_pitch: &by_pitch,
            batter_exit_velo: self.exit_velo_for(batter),
            iso_trend: iso_trend.as_ref(),
            due,
        };
        Ok(score_hr_potential(&ctx, &self.config))
    }
}

fn summarize_team(reports: &[BatterArsenalReport]) -> TeamSummary {
    let favorable_count = reports
        .iter()
        .filter(|r| r.result.overall_advantage > FAVORABLE_ADVANTAGE)
        .count();
    let difficult_count = reports
        .iter()
        .filter(|r| r.result.overall_advantage < DIFFICULT_ADVANTAGE)
        .count();
    let average_advantage = if reports.is_empty() {
        0.0
    } else {
        reports
            .iter()
            .map(|r| r.result.overall_advantage)
            .sum::<f64>()
            / reports.len() as f64
    };

    let mut ranked: Vec<&BatterArsenalReport> = reports.iter().collect();
    ranked.sort_by(|a, b| {
        b.result
            .overall_advantage
            .partial_cmp(&a.result.overall_advantage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_targets: Vec<String> = ranked
        .iter()
        .filter(|r| r.result.overall_advantage > FAVORABLE_ADVANTAGE)
        .take(SUMMARY_LIMIT)
        .map(|r| r.batter.clone())
        .collect();
    let toughest_matchups: Vec<String> = ranked
        .iter()
        .rev()
        .filter(|r| r.result.overall_advantage < DIFFICULT_ADVANTAGE)
        .take(SUMMARY_LIMIT)
        .map(|r| r.batter.clone())
        .collect();

    TeamSummary {
        favorable_count,
        difficult_count,
        average_advantage,
        top_targets,
        toughest_matchups,
    }
}

// ---------------------------------------------------------------------------
// Batch analysis
// ---------------------------------------------------------------------------

/// Analyze a slate of independent batter-pitcher pairs concurrently,
/// bounded by `max_concurrency` tokio tasks. The computations share only
/// the read-only engine; results come back in input order.
pub async fn analyze_slate(
    engine: Arc<MatchupEngine>,
    pairs: Vec<(PlayerRef, PlayerRef)>,
    active_years: Vec<u16>,
    max_concurrency: usize,
) -> Result<Vec<MatchupScore>, EngineError> {
    for (batter, pitcher) in &pairs {
        validate_ref(batter, "batter name")?;
        validate_ref(pitcher, "pitcher name")?;
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut handles = Vec::with_capacity(pairs.len());
    for (batter, pitcher) in pairs {
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let years = active_years.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| EngineError::TaskFailed(e.to_string()))?;
            engine.analyze_matchup(&batter, &pitcher, &years)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let score = handle
            .await
            .map_err(|e| EngineError::TaskFailed(e.to_string()))??;
        results.push(score);
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
