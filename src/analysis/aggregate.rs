// Season and multi-year aggregation.
//
// Reduces raw per-game logs into season rates, and pools per-pitch arsenal
// rows across years into a recency-weighted player profile. Zero
// denominators always resolve to a 0 rate plus an explicit
// insufficient-sample flag, never NaN.

use crate::config::RecencyWeights;
use crate::data::{ArsenalRow, GameLog};
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Game-log season aggregation
// ---------------------------------------------------------------------------

/// Season totals and derived rates from per-game logs.
///
/// Game logs carry no extra-base-hit columns, so SLG and ISO cannot be
/// derived here; those live on the pooled [`PlayerProfile`] built from
/// arsenal splits.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeasonAggregate {
    pub games: usize,
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub hr: u32,
    pub bb: u32,
    pub so: u32,
    pub avg: f64,
    pub hr_per_pa: f64,
    pub k_rate: f64,
    pub bb_rate: f64,
    pub insufficient_sample: bool,
}

fn safe_rate(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Aggregate a set of game logs into season totals and rates.
pub fn aggregate_games(games: &[GameLog]) -> SeasonAggregate {
    let mut agg = SeasonAggregate {
        games: games.len(),
        ..SeasonAggregate::default()
    };
    for g in games {
        agg.pa += g.pa();
        agg.ab += g.ab;
        agg.h += g.h;
        agg.hr += g.hr;
        agg.bb += g.bb;
        agg.so += g.so;
    }
    agg.avg = safe_rate(agg.h, agg.ab);
    agg.hr_per_pa = safe_rate(agg.hr, agg.pa);
    agg.k_rate = safe_rate(agg.so, agg.pa);
    agg.bb_rate = safe_rate(agg.bb, agg.pa);
    agg.insufficient_sample = agg.pa == 0 || agg.ab == 0;
    agg
}

// ---------------------------------------------------------------------------
// Recency-weighted multi-year pooling
// ---------------------------------------------------------------------------

/// A player's pooled rates across years and pitch types. Rate stats are
/// recency- and volume-weighted means; counting stats are raw sums.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerProfile {
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub hr: u32,
    pub pitches: u32,
    pub ba: f64,
    pub slg: f64,
    pub iso: f64,
    pub woba: f64,
    pub whiff_pct: f64,
    pub hard_hit_rate: f64,
    pub k_rate: f64,
    pub rv100: f64,
    pub years: Vec<u16>,
    pub insufficient_sample: bool,
}

/// Weighted-mean accumulator; returns 0 when no weight was accumulated.
#[derive(Debug, Default, Clone, Copy)]
struct WeightedMean {
    sum: f64,
    weight: f64,
}

impl WeightedMean {
    fn add(&mut self, value: f64, weight: f64) {
        if weight > 0.0 && value.is_finite() {
            self.sum += value * weight;
            self.weight += weight;
        }
    }

    fn get(&self) -> f64 {
        if self.weight > 0.0 {
            self.sum / self.weight
        } else {
            0.0
        }
    }
}

/// Pool arsenal rows into a single current-form profile.
///
/// Each row's weight is its pitch volume scaled by the recency weight of
/// its year relative to the most recent year present, so the composite is
/// recency-biased by design.
pub fn pooled_profile(rows: &[&ArsenalRow], recency: &RecencyWeights) -> PlayerProfile {
    let mut profile = PlayerProfile::default();
    let latest = match rows.iter().map(|r| r.year).max() {
        Some(y) => y,
        None => {
            profile.insufficient_sample = true;
            return profile;
        }
    };

    let mut ba = WeightedMean::default();
    let mut slg = WeightedMean::default();
    let mut woba = WeightedMean::default();
    let mut whiff = WeightedMean::default();
    let mut hard_hit = WeightedMean::default();
    let mut k_rate = WeightedMean::default();
    let mut rv100 = WeightedMean::default();
    let mut years: Vec<u16> = Vec::new();

    for row in rows {
        let back = (latest - row.year) as usize;
        let w = recency.weight(back) * row.pitches.max(1) as f64;

        profile.pa += row.pa;
        profile.ab += row.ab;
        profile.h += row.h;
        profile.hr += row.hr;
        profile.pitches += row.pitches;
        if !years.contains(&row.year) {
            years.push(row.year);
        }

        ba.add(row.ba, w);
        slg.add(row.slg, w);
        woba.add(row.woba, w);
        whiff.add(row.whiff_pct, w);
        hard_hit.add(row.hard_hit_rate, w);
        rv100.add(row.rv100, w);
        if row.pa > 0 {
            k_rate.add(row.k_rate(), w);
        }
    }

    years.sort_unstable();
    profile.years = years;
    profile.ba = ba.get();
    profile.slg = slg.get();
    profile.iso = profile.slg - profile.ba;
    profile.woba = woba.get();
    profile.whiff_pct = whiff.get();
    profile.hard_hit_rate = hard_hit.get();
    profile.k_rate = k_rate.get();
    profile.rv100 = rv100.get();
    profile.insufficient_sample = profile.pa == 0;
    profile
}

/// Per-year volume-weighted averages of one metric, sorted chronologically.
/// Feeds the year-over-year trend analyzer.
pub fn yearly_series<F>(rows: &[&ArsenalRow], value: F) -> Vec<(u16, f64)>
where
    F: Fn(&ArsenalRow) -> f64,
{
    let mut by_year: BTreeMap<u16, WeightedMean> = BTreeMap::new();
    for row in rows {
        by_year
            .entry(row.year)
            .or_default()
            .add(value(row), row.pitches.max(1) as f64);
    }
    by_year.into_iter().map(|(y, m)| (y, m.get())).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
