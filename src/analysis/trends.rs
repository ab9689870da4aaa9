// Year-over-year and recent-form trend detection, plus the fixed piecewise
// conversions from trend to composite bonus. Both bonuses are clamped so a
// single factor can never swamp the final score.

use crate::data::GameLog;
use serde::Serialize;

/// Direction changes smaller than this count as stable.
const STABLE_EPSILON: f64 = 1e-3;
/// Yearly series with a standard deviation under this are rewarded as steady.
const CONSISTENCY_STEADY: f64 = 0.03;
/// Yearly series with a standard deviation over this are penalized as volatile.
const CONSISTENCY_VOLATILE: f64 = 0.12;
/// Historical bonus band.
const HISTORICAL_BONUS_CLAMP: f64 = 25.0;
/// Recent-form bonus band.
const RECENT_BONUS_CLAMP: f64 = 30.0;

// ---------------------------------------------------------------------------
// Trend types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// One detected trend: where the metric started, where it is now, how far
/// it moved, and how noisy the series was along the way.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub magnitude: f64,
    pub early: f64,
    pub recent: f64,
    pub consistency: f64,
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn direction_of(early: f64, recent: f64) -> TrendDirection {
    let diff = recent - early;
    if diff > STABLE_EPSILON {
        TrendDirection::Improving
    } else if diff < -STABLE_EPSILON {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

// ---------------------------------------------------------------------------
// Historical (year-over-year)
// ---------------------------------------------------------------------------

/// Trend over a chronologically sorted yearly series. Needs at least two
/// distinct years; compares the earliest value against the most recent and
/// measures consistency as the population standard deviation of the series.
pub fn series_trend(series: &[(u16, f64)]) -> Option<TrendResult> {
    if series.len() < 2 {
        return None;
    }
    let early = series[0].1;
    let recent = series[series.len() - 1].1;
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    Some(TrendResult {
        direction: direction_of(early, recent),
        magnitude: (recent - early).abs(),
        early,
        recent,
        consistency: population_std(&values),
    })
}

/// Convert year-over-year trends into a composite bonus.
///
/// Each metric contributes its signed magnitude scaled by 100, adjusted for
/// consistency: steady non-declining series earn a small reward, steady
/// decliners and volatile series a small penalty. The per-metric scores are
/// averaged and clamped to ±25.
pub fn historical_bonus(trends: &[TrendResult]) -> f64 {
    if trends.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for t in trends {
        let mut score = match t.direction {
            TrendDirection::Improving => t.magnitude * 100.0,
            TrendDirection::Declining => -t.magnitude * 100.0,
            TrendDirection::Stable => 0.0,
        };
        if t.consistency < CONSISTENCY_STEADY {
            if t.direction == TrendDirection::Declining {
                score -= 3.0;
            } else {
                score += 5.0;
            }
        } else if t.consistency > CONSISTENCY_VOLATILE {
            score -= 3.0;
        }
        total += score;
    }
    (total / trends.len() as f64).clamp(-HISTORICAL_BONUS_CLAMP, HISTORICAL_BONUS_CLAMP)
}

// ---------------------------------------------------------------------------
// Recent form (within-window)
// ---------------------------------------------------------------------------

/// Split-half trends over a recent-game window plus the window totals the
/// bonus ladder needs. A trend is `None` (explicitly "no trend computed",
/// not zero) when the window is too small or a half has no denominator.
#[derive(Debug, Clone, Serialize)]
pub struct RecentForm {
    pub hr_trend: Option<TrendResult>,
    pub hit_trend: Option<TrendResult>,
    pub pa: u32,
    pub ab: u32,
    pub hr_per_pa: f64,
    pub avg: f64,
    pub games: usize,
}

fn half_rates(games: &[GameLog]) -> (Option<f64>, Option<f64>) {
    let pa: u32 = games.iter().map(|g| g.pa()).sum();
    let ab: u32 = games.iter().map(|g| g.ab).sum();
    let hr: u32 = games.iter().map(|g| g.hr).sum();
    let h: u32 = games.iter().map(|g| g.h).sum();
    let hr_per_pa = if pa > 0 { Some(hr as f64 / pa as f64) } else { None };
    let avg = if ab > 0 { Some(h as f64 / ab as f64) } else { None };
    (hr_per_pa, avg)
}

fn split_trend(early: Option<f64>, recent: Option<f64>) -> Option<TrendResult> {
    let (early, recent) = (early?, recent?);
    Some(TrendResult {
        direction: direction_of(early, recent),
        magnitude: (recent - early).abs(),
        early,
        recent,
        consistency: population_std(&[early, recent]),
    })
}

/// Analyze a most-recent-first game window by comparing its newer half
/// against its older half. Returns `None` only for an empty window; with
/// fewer than two games the totals are reported but no trend is computed.
pub fn recent_form(games_desc: &[GameLog]) -> Option<RecentForm> {
    if games_desc.is_empty() {
        return None;
    }

    let mut pa = 0u32;
    let mut ab = 0u32;
    let mut h = 0u32;
    let mut hr = 0u32;
    for g in games_desc {
        pa += g.pa();
        ab += g.ab;
        h += g.h;
        hr += g.hr;
    }

    let (hr_trend, hit_trend) = if games_desc.len() >= 2 {
        let mid = games_desc.len() / 2;
        let (recent_half, early_half) = games_desc.split_at(mid.max(1));
        let (recent_hr, recent_avg) = half_rates(recent_half);
        let (early_hr, early_avg) = half_rates(early_half);
        (
            split_trend(early_hr, recent_hr),
            split_trend(early_avg, recent_avg),
        )
    } else {
        (None, None)
    };

    Some(RecentForm {
        hr_trend,
        hit_trend,
        pa,
        ab,
        hr_per_pa: if pa > 0 { hr as f64 / pa as f64 } else { 0.0 },
        avg: if ab > 0 { h as f64 / ab as f64 } else { 0.0 },
        games: games_desc.len(),
    })
}

/// Convert recent form into a composite bonus.
///
/// An improving HR trend adds 15 per point of magnitude (scaled by 100), a
/// declining one subtracts 12; the absolute recent HR and contact levels
/// add flat bonuses/penalties; a sharply improving hit rate adds a little
/// more. Clamped to ±30.
pub fn recent_bonus(form: &RecentForm) -> f64 {
    let mut bonus = 0.0;

    if let Some(t) = &form.hr_trend {
        match t.direction {
            TrendDirection::Improving => bonus += 15.0 * t.magnitude * 100.0,
            TrendDirection::Declining => bonus -= 12.0 * t.magnitude * 100.0,
            TrendDirection::Stable => {}
        }
    }

    if form.hr_per_pa > 0.05 {
        bonus += 20.0;
    } else if form.hr_per_pa > 0.03 {
        bonus += 10.0;
    } else if form.hr_per_pa < 0.01 && form.pa > 20 {
        bonus -= 10.0;
    }

    if form.avg > 0.300 {
        bonus += 15.0;
    } else if form.avg > 0.275 {
        bonus += 8.0;
    } else if form.avg < 0.200 && form.ab > 10 {
        bonus -= 12.0;
    }

    if let Some(t) = &form.hit_trend {
        if t.direction == TrendDirection::Improving && t.magnitude > 0.05 {
            bonus += 10.0;
        }
    }

    bonus.clamp(-RECENT_BONUS_CLAMP, RECENT_BONUS_CLAMP)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
