// Population normalization ranges and the 0..scale normalization function.
//
// Ranges are 2nd–98th percentile bounds over all observed values for a
// metric in the active population. They are recomputed whenever the active
// years selection changes, never treated as one-time constants.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Threshold below which a range span is treated as degenerate.
const SPAN_EPSILON: f64 = 1e-9;

/// Per-metric {min, max} bounds used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub fn new(min: f64, max: f64) -> Self {
        MetricRange { min, max }
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }
}

// ---------------------------------------------------------------------------
// Static fallback table
// ---------------------------------------------------------------------------

/// Built-in fallback ranges, used when the population is too small to
/// support percentile bounds or collapses to a single value.
pub fn builtin_default_ranges() -> HashMap<String, MetricRange> {
    let mut m = HashMap::new();
    m.insert("slg".to_string(), MetricRange::new(0.250, 0.650));
    m.insert("iso".to_string(), MetricRange::new(0.050, 0.350));
    m.insert("hard_hit".to_string(), MetricRange::new(0.20, 0.60));
    m.insert("barrel".to_string(), MetricRange::new(0.02, 0.20));
    m.insert("woba".to_string(), MetricRange::new(0.1, 0.6));
    // Whiff rates are percentage points, not fractions.
    m.insert("whiff".to_string(), MetricRange::new(15.0, 35.0));
    m.insert("hr".to_string(), MetricRange::new(0.0, 25.0));
    m.insert("rv100".to_string(), MetricRange::new(-10.0, 10.0));
    m.insert("usage".to_string(), MetricRange::new(0.0, 100.0));
    m.insert("k_rate".to_string(), MetricRange::new(0.05, 0.5));
    m.insert("hit_rate".to_string(), MetricRange::new(0.1, 0.5));
    m.insert("hr_rate".to_string(), MetricRange::new(0.0, 0.15));
    m.insert("obp".to_string(), MetricRange::new(0.2, 0.5));
    m
}

// ---------------------------------------------------------------------------
// Range computation
// ---------------------------------------------------------------------------

/// Compute the normalization range for one metric from its population values.
///
/// Non-finite values are discarded first. The bounds are the values at the
/// 2nd and 98th percentile positions; if those coincide the range widens to
/// the true min/max, and if that is still degenerate (or the population is
/// smaller than `min_observations`) the static default for the metric is
/// used. Returns `None` only for a metric with no default and no usable
/// population.
pub fn compute_range(
    values: &[f64],
    metric: &str,
    defaults: &HashMap<String, MetricRange>,
    min_observations: usize,
) -> Option<MetricRange> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.len() < min_observations.max(2) {
        return defaults.get(metric).copied();
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let lo_idx = ((n - 1) as f64 * 0.02).round() as usize;
    let hi_idx = ((n - 1) as f64 * 0.98).round() as usize;
    let mut lo = sorted[lo_idx];
    let mut hi = sorted[hi_idx];

    if (hi - lo).abs() < SPAN_EPSILON {
        // Percentiles coincide: widen to the true extremes.
        lo = sorted[0];
        hi = sorted[n - 1];
    }
    if (hi - lo).abs() < SPAN_EPSILON {
        return defaults.get(metric).copied();
    }
    Some(MetricRange::new(lo, hi))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a value into `[0, scale]` against a metric range.
///
/// The value is clamped into the range, linearly rescaled to [0, 1],
/// inverted when lower values are better, then scaled. With no range
/// available, a raw value that already looks like a 0–1 rate is used
/// directly (inverted as needed); anything else lands on the neutral
/// midpoint of the scale.
pub fn normalize(value: f64, range: Option<MetricRange>, scale: f64, higher_is_better: bool) -> f64 {
    if !value.is_finite() {
        return scale * 0.5;
    }
    match range {
        Some(r) if r.span().abs() >= SPAN_EPSILON => {
            let clamped = value.clamp(r.min.min(r.max), r.max.max(r.min));
            let mut unit = (clamped - r.min) / r.span();
            if !higher_is_better {
                unit = 1.0 - unit;
            }
            unit * scale
        }
        Some(r) => {
            // Degenerate range: everything at or above the point gets the
            // neutral midpoint, everything below gets the floor.
            if value >= r.min {
                scale * 0.5
            } else {
                0.0
            }
        }
        None => {
            if (0.0..=1.0).contains(&value) {
                let unit = if higher_is_better { value } else { 1.0 - value };
                unit * scale
            } else {
                scale * 0.5
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn no_defaults() -> HashMap<String, MetricRange> {
        HashMap::new()
    }

    // -- Range computation --

    #[test]
    fn percentile_bounds_trim_outliers() {
        // 101 evenly spaced values 0..=100; the 2nd/98th percentile bounds
        // should cut off the extreme values.
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let r = compute_range(&values, "slg", &no_defaults(), 2).unwrap();
        assert!(approx_eq(r.min, 2.0));
        assert!(approx_eq(r.max, 98.0));
    }

    #[test]
    fn coinciding_percentiles_widen_to_extremes() {
        // Heavy mass at 0.3 with two stragglers: both percentile positions
        // land on 0.3, so the range widens to the true min/max.
        let mut values = vec![0.3; 20];
        values.push(0.1);
        values.push(0.5);
        let r = compute_range(&values, "slg", &no_defaults(), 2).unwrap();
        assert!(approx_eq(r.min, 0.1));
        assert!(approx_eq(r.max, 0.5));
    }

    #[test]
    fn identical_population_falls_back_to_default() {
        let values = vec![0.42; 50];
        let defaults = builtin_default_ranges();
        let r = compute_range(&values, "slg", &defaults, 2).unwrap();
        assert!(approx_eq(r.min, 0.250));
        assert!(approx_eq(r.max, 0.650));
    }

    #[test]
    fn small_population_falls_back_to_default() {
        let values = vec![0.2, 0.3, 0.4];
        let defaults = builtin_default_ranges();
        let r = compute_range(&values, "iso", &defaults, 10).unwrap();
        assert!(approx_eq(r.min, 0.050));
        assert!(approx_eq(r.max, 0.350));
    }

    #[test]
    fn whiff_default_covers_degenerate_population() {
        // A whiff population that collapses to one value still normalizes
        // against the percentage-point fallback instead of going neutral.
        let values = vec![24.0; 50];
        let defaults = builtin_default_ranges();
        let r = compute_range(&values, "whiff", &defaults, 10).unwrap();
        assert!(approx_eq(r.min, 15.0));
        assert!(approx_eq(r.max, 35.0));
        assert!(normalize(30.0, Some(r), 100.0, false) < 50.0);
    }

    #[test]
    fn unknown_metric_without_population_is_none() {
        assert!(compute_range(&[], "mystery", &no_defaults(), 2).is_none());
    }

    #[test]
    fn non_finite_values_discarded() {
        let mut values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        values.push(f64::NAN);
        values.push(f64::INFINITY);
        let r = compute_range(&values, "slg", &no_defaults(), 2).unwrap();
        assert!(r.min.is_finite() && r.max.is_finite());
    }

    // -- Normalization --

    #[test]
    fn normalize_is_bounded_for_any_finite_value() {
        let r = Some(MetricRange::new(0.2, 0.6));
        for v in [-1e9, -1.0, 0.0, 0.2, 0.4, 0.6, 1.0, 1e9] {
            let n = normalize(v, r, 100.0, true);
            assert!((0.0..=100.0).contains(&n), "normalize({v}) = {n}");
        }
    }

    #[test]
    fn normalize_linear_inside_range() {
        let r = Some(MetricRange::new(0.0, 1.0));
        assert!(approx_eq(normalize(0.25, r, 100.0, true), 25.0));
        assert!(approx_eq(normalize(0.25, r, 100.0, false), 75.0));
    }

    #[test]
    fn normalize_clamps_outside_range() {
        let r = Some(MetricRange::new(0.2, 0.6));
        assert!(approx_eq(normalize(0.0, r, 100.0, true), 0.0));
        assert!(approx_eq(normalize(0.9, r, 100.0, true), 100.0));
    }

    #[test]
    fn degenerate_range_yields_midpoint_or_floor() {
        let r = Some(MetricRange::new(0.3, 0.3));
        assert!(approx_eq(normalize(0.3, r, 100.0, true), 50.0));
        assert!(approx_eq(normalize(0.5, r, 100.0, true), 50.0));
        assert!(approx_eq(normalize(0.1, r, 100.0, true), 0.0));
    }

    #[test]
    fn missing_range_rate_like_value_used_directly() {
        assert!(approx_eq(normalize(0.7, None, 100.0, true), 70.0));
        assert!(approx_eq(normalize(0.7, None, 100.0, false), 30.0));
    }

    #[test]
    fn missing_range_non_rate_value_is_neutral() {
        assert!(approx_eq(normalize(42.0, None, 100.0, true), 50.0));
        assert!(approx_eq(normalize(-3.0, None, 100.0, false), 50.0));
    }

    #[test]
    fn nan_value_is_neutral() {
        let r = Some(MetricRange::new(0.0, 1.0));
        assert!(approx_eq(normalize(f64::NAN, r, 100.0, true), 50.0));
    }
}
